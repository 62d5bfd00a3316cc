//! Completion-rate and level/XP progress computations.

/// XP needed to reach each level, level 1 first.
pub const DEFAULT_LEVEL_THRESHOLDS: &[u64] = &[0, 100, 250, 450, 700, 1000, 1400, 1900, 2500, 3200];

/// `completed / total * 100` rounded to the nearest integer; 0 when
/// `total` is 0.
pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Rounded mean of progress values; 0 for an empty input.
pub fn average_progress<I>(values: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), value| (sum + u64::from(value), count + 1));
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u32
}

/// Position of an XP total inside its level band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: u32,
    /// XP earned since reaching `level`.
    pub xp_into_level: u64,
    /// Width of the current band; `None` at the top level.
    pub band_width: Option<u64>,
    /// `xp_into_level / band_width` in `0.0..=1.0`; 1.0 at the top level.
    pub fraction: f64,
}

/// Strictly increasing XP thresholds, starting at 0 for level 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    thresholds: Vec<u64>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_LEVEL_THRESHOLDS.to_vec(),
        }
    }
}

impl LevelTable {
    /// Builds a table.
    ///
    /// # Errors
    /// Returns a message when `thresholds` is empty, does not start at 0, or
    /// is not strictly increasing.
    pub fn new(thresholds: Vec<u64>) -> Result<Self, String> {
        match thresholds.first() {
            None => return Err("level thresholds must not be empty".to_string()),
            Some(&first) if first != 0 => {
                return Err(format!("level thresholds must start at 0, got {first}"))
            }
            Some(_) => {}
        }
        if let Some(pair) = thresholds.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(format!(
                "level thresholds must be strictly increasing, got {} then {}",
                pair[0], pair[1]
            ));
        }
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Highest level whose threshold is at or below `xp`.
    pub fn level_for_xp(&self, xp: u64) -> u32 {
        self.thresholds
            .iter()
            .take_while(|&&threshold| threshold <= xp)
            .count()
            .max(1) as u32
    }

    /// Level and in-band progress for `xp`. XP beyond the top threshold
    /// reports the top level with a full band.
    pub fn progress(&self, xp: u64) -> LevelProgress {
        let level = self.level_for_xp(xp);
        let index = (level - 1) as usize;
        let floor = self.thresholds[index];
        let xp_into_level = xp - floor;

        match self.thresholds.get(index + 1) {
            Some(&ceiling) => {
                let band_width = ceiling - floor;
                LevelProgress {
                    level,
                    xp_into_level,
                    band_width: Some(band_width),
                    fraction: xp_into_level as f64 / band_width as f64,
                }
            }
            None => LevelProgress {
                level,
                xp_into_level,
                band_width: None,
                fraction: 1.0,
            },
        }
    }
}
