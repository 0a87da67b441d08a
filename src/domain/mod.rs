pub mod catalog;
pub mod contact;
pub mod dashboard;
pub mod errors;
pub mod notification;
pub mod order;
pub mod order_flow;
pub mod ports;
pub mod review;
pub mod user;
