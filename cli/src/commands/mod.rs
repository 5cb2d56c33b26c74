pub mod coach;
pub mod goal;
pub mod health;
pub mod quest;
pub mod session;
