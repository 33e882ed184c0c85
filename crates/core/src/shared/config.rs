/// Placement of the face cutout, as fractions of the output surface.
///
/// Immutable once loaded. Values are expected in [0, 1] but not clamped;
/// out-of-range values are logged and used as given.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutoutConfig {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Blend-edge softness relative to the smaller side of the target box.
    pub feather: f64,
}

pub const DEFAULT_X: f64 = 0.72;
pub const DEFAULT_Y: f64 = 0.24;
pub const DEFAULT_W: f64 = 0.23;
pub const DEFAULT_H: f64 = 0.23;
pub const DEFAULT_FEATHER: f64 = 0.08;

impl Default for CutoutConfig {
    fn default() -> Self {
        Self {
            x: DEFAULT_X,
            y: DEFAULT_Y,
            w: DEFAULT_W,
            h: DEFAULT_H,
            feather: DEFAULT_FEATHER,
        }
    }
}

impl CutoutConfig {
    /// Parses `x`, `y`, `w`, `h` and `feather` from a query string such as
    /// `?x=0.70&y=0.25`. Each value is read up to its first non-numeric
    /// character. Missing, non-numeric or non-finite values keep their
    /// defaults; unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut config = Self::default();
        let query = query.trim().trim_start_matches('?');

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let slot = match key {
                "x" => &mut config.x,
                "y" => &mut config.y,
                "w" => &mut config.w,
                "h" => &mut config.h,
                "feather" => &mut config.feather,
                _ => continue,
            };
            match parse_fraction(raw) {
                Some(value) => *slot = value,
                None => log::debug!("Ignoring unparsable config value {key}={raw:?}"),
            }
        }

        config.warn_out_of_range();
        config
    }

    fn warn_out_of_range(&self) {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("w", self.w),
            ("h", self.h),
            ("feather", self.feather),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                log::warn!("Config {name}={value} is outside [0, 1]");
            }
        }
    }
}

/// Reads the leading decimal number of `raw`, ignoring trailing text such
/// as units (`0.3px` reads as 0.3).
fn parse_fraction(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if frac_digits > 0 || int_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = digits(end + 1 + sign);
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
