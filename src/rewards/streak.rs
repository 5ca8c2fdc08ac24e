use crate::models::user::User;
use chrono::NaiveDate;

/// Update the daily streak for a dashboard visit on `today`
///
/// Consecutive days extend the streak, a gap resets it to 1, and repeat
/// visits on the same day leave it unchanged.
pub fn record_visit(user: &mut User, today: NaiveDate) {
    match user.last_activity {
        Some(last) => {
            let gap = (today - last).num_days();
            if gap == 1 {
                user.streak += 1;
            } else if gap > 1 {
                user.streak = 1;
            }
        }
        None => user.streak = 1,
    }

    user.last_activity = Some(today);
}
