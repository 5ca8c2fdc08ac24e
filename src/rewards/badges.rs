use crate::models::user::User;

pub const POINTS_PER_BADGE: u64 = 50;

pub fn badges_for(points: u64) -> u64 {
    points / POINTS_PER_BADGE
}

/// Grant any badges the user's points now cover. Badges are never taken away.
///
/// Returns true if a new badge was earned.
pub fn refresh(user: &mut User) -> bool {
    let count = badges_for(user.points);
    if count <= user.badges_earned {
        return false;
    }

    user.badges_earned = count;
    user.badges = (1..=count).map(|i| format!("Badge {i}")).collect();
    true
}
