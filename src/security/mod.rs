pub mod login_throttle;
