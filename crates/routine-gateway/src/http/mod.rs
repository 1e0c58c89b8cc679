pub mod health;
pub mod mode;
pub mod response;
pub mod routines;
pub mod ui;
