pub mod health;
pub mod update;
pub mod verify;
