pub mod card;
pub mod quiz;
pub mod skill;
pub mod user;
pub mod views;
