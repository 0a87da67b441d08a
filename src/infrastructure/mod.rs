pub mod catalog_repo;
pub mod contact_repo;
pub mod dashboard_repo;
pub mod mailer;
pub mod models;
pub mod order_repo;
pub mod review_repo;
pub mod security;
pub mod user_repo;

#[cfg(test)]
pub(crate) mod testing;
