//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Plain CRUD returns
//! `sqlx::Error`; methods enforcing domain rules return `DbError`.

pub mod batch_repo;
pub mod dataset_repo;
pub mod image_repo;
pub mod member_repo;
pub mod project_repo;
pub mod review_repo;
pub mod task_repo;
pub mod user_repo;

pub use batch_repo::BatchRepo;
pub use dataset_repo::DatasetRepo;
pub use image_repo::ImageRepo;
pub use member_repo::MemberRepo;
pub use project_repo::ProjectRepo;
pub use review_repo::ReviewRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
