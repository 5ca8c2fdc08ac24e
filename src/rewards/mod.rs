pub mod badges;
pub mod quiz;
pub mod streak;
