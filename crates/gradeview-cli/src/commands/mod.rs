pub mod grade;
pub mod review;
pub mod validate;
