use chrono::Duration;

pub trait HumanDuration {
    /// Formats the duration as hours and minutes, e.g. "2h 05m" or "30m".
    fn to_human(&self) -> String;
}

impl HumanDuration for Duration {
    fn to_human(&self) -> String {
        let minutes = self.num_minutes().max(0);
        let (hours, minutes) = (minutes / 60, minutes % 60);
        if hours > 0 { format!("{}h {:02}m", hours, minutes) } else { format!("{}m", minutes) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::zero(), "0m")]
    #[case(Duration::seconds(59), "0m")]
    #[case(Duration::minutes(30), "30m")]
    #[case(Duration::minutes(125), "2h 05m")]
    #[case(Duration::hours(24), "24h 00m")]
    #[case(Duration::minutes(-5), "0m")]
    fn to_human(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(duration.to_human(), expected);
    }
}
