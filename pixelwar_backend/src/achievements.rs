use crate::canvas::Canvas;
use crate::types::{Achievement, AchievementKind};

// Achievement progress is derived reporting layered on the placement path:
// it never gates a write. Progress only moves forward and completion flips
// once, stamping the completion time.

const SQUARE_SIZE: u32 = 3;
const LINE_LENGTH: u32 = 5;

pub fn default_achievements() -> Vec<Achievement> {
    fn achievement(
        id: &str,
        kind: AchievementKind,
        title: &str,
        description: &str,
        max_progress: u32,
        reward: &str,
    ) -> Achievement {
        Achievement {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            progress: 0,
            max_progress,
            reward: Some(reward.to_string()),
            date: None,
        }
    }

    vec![
        achievement(
            "pixel-10",
            AchievementKind::PixelMilestone,
            "Pixel Beginner",
            "Place 10 pixels on the canvas",
            10,
            "Unlock basic colors",
        ),
        achievement(
            "pixel-50",
            AchievementKind::PixelMilestone,
            "Pixel Enthusiast",
            "Place 50 pixels on the canvas",
            50,
            "Reduced cooldown time (9s)",
        ),
        achievement(
            "pixel-100",
            AchievementKind::PixelMilestone,
            "Pixel Master",
            "Place 100 pixels on the canvas",
            100,
            "Color Bomb unlocked",
        ),
        achievement(
            "territory-10",
            AchievementKind::TerritoryControl,
            "Territory Claimer",
            "Help your team control 10% of the canvas",
            10,
            "Team color boost",
        ),
        achievement(
            "territory-25",
            AchievementKind::TerritoryControl,
            "Territory Dominator",
            "Help your team control 25% of the canvas",
            25,
            "Territory Shield unlocked",
        ),
        achievement(
            "pattern-square",
            AchievementKind::PatternBuilder,
            "Square Builder",
            "Create a 3x3 square of the same color",
            1,
            "Pattern recognition badge",
        ),
        achievement(
            "pattern-line",
            AchievementKind::PatternBuilder,
            "Line Artist",
            "Create a straight line of 5 pixels",
            1,
            "Line drawing tool",
        ),
    ]
}

fn color_at<'a>(canvas: &'a Canvas, x: i64, y: i64) -> Option<&'a str> {
    if x < 0 || y < 0 {
        return None;
    }
    canvas.read(x as u32, y as u32).map(|pixel| pixel.color.as_str())
}

/// Is the just-placed pixel part of a 3x3 block of one color? Checks every
/// 3x3 window containing (x, y).
fn completes_square(canvas: &Canvas, x: u32, y: u32, color: &str) -> bool {
    let (x, y) = (x as i64, y as i64);
    let span = (SQUARE_SIZE - 1) as i64;
    for corner_x in (x - span)..=x {
        for corner_y in (y - span)..=y {
            let filled = (corner_x..corner_x + SQUARE_SIZE as i64).all(|cx| {
                (corner_y..corner_y + SQUARE_SIZE as i64)
                    .all(|cy| color_at(canvas, cx, cy) == Some(color))
            });
            if filled {
                return true;
            }
        }
    }
    false
}

/// Is the just-placed pixel part of a straight same-color run of 5, in
/// either axis? A contiguous run of >= 5 through the pixel is equivalent to
/// some 5-window containing it.
fn completes_line(canvas: &Canvas, x: u32, y: u32, color: &str) -> bool {
    let (x, y) = (x as i64, y as i64);
    for (dx, dy) in [(1i64, 0i64), (0, 1)] {
        let mut run = 1u32;
        let (mut cx, mut cy) = (x - dx, y - dy);
        while color_at(canvas, cx, cy) == Some(color) {
            run += 1;
            cx -= dx;
            cy -= dy;
        }
        let (mut cx, mut cy) = (x + dx, y + dy);
        while color_at(canvas, cx, cy) == Some(color) {
            run += 1;
            cx += dx;
            cy += dy;
        }
        if run >= LINE_LENGTH {
            return true;
        }
    }
    false
}

fn advance(achievement: &mut Achievement, progress: u32, now: u64) -> bool {
    // Monotonic: a later snapshot can be lower (territory share shrinks) but
    // recorded progress never moves backwards.
    achievement.progress = achievement.progress.max(progress.min(achievement.max_progress));
    if !achievement.completed && achievement.progress >= achievement.max_progress {
        achievement.completed = true;
        achievement.date = Some(now);
        return true;
    }
    false
}

/// Update the user's achievements after an accepted placement at (x, y).
/// Returns the achievements newly completed by this placement.
pub fn on_pixel_placed(
    achievements: &mut [Achievement],
    canvas: &Canvas,
    x: u32,
    y: u32,
    pixels_placed: u64,
    team_percentage: f64,
    now: u64,
) -> Vec<Achievement> {
    let color = match canvas.read(x, y) {
        Some(pixel) => pixel.color.clone(),
        None => return Vec::new(),
    };

    let mut unlocked = Vec::new();
    for achievement in achievements.iter_mut() {
        let progress = match achievement.kind {
            AchievementKind::PixelMilestone => pixels_placed.min(u32::MAX as u64) as u32,
            AchievementKind::TerritoryControl => team_percentage.floor() as u32,
            AchievementKind::PatternBuilder => {
                let matched = match achievement.id.as_str() {
                    "pattern-square" => completes_square(canvas, x, y, &color),
                    "pattern-line" => completes_line(canvas, x, y, &color),
                    _ => false,
                };
                if matched {
                    1
                } else {
                    achievement.progress
                }
            }
        };
        if advance(achievement, progress, now) {
            unlocked.push(achievement.clone());
        }
    }
    unlocked
}
