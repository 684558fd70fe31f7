pub mod auth_service;
pub mod order_service;
pub mod product_service;
pub mod roster_service;
pub mod student_service;
