// Internal modules
use crate::daily::boost::step_1_data_preparation::PriceBar;

/// Calculates close-to-close returns
///
/// `returns[t] = (close[t] - close[t-1]) / close[t-1]`. The first bar has no
/// prior close and gets `None`; so does any bar whose result is not finite
/// (a zero prior close).
pub fn calculate_close_returns(bars: &[PriceBar]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(bars.len());
    if bars.is_empty() {
        return returns;
    }

    returns.push(None);
    for window in bars.windows(2) {
        let prev = window[0].close;
        let curr = window[1].close;
        let change = (curr - prev) / prev;
        returns.push(change.is_finite().then_some(change));
    }
    returns
}

/// Calculates next-bar direction labels
///
/// The label is `0` when the next close is strictly higher than the current
/// close and `1` otherwise, so an unchanged close is labeled `1`. The last
/// bar has no next close and gets `None`.
pub fn calculate_direction_labels(bars: &[PriceBar]) -> Vec<Option<u8>> {
    let mut labels: Vec<Option<u8>> = bars
        .windows(2)
        .map(|window| {
            let label = if window[1].close > window[0].close { 0 } else { 1 };
            Some(label)
        })
        .collect();
    if !bars.is_empty() {
        labels.push(None);
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_close_returns() {
        let bars = bars_from_closes(&[100.0, 110.0, 99.0]);
        let returns = calculate_close_returns(&bars);
        assert_eq!(returns.len(), 3);
        assert!(returns[0].is_none());
        assert!((returns[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((returns[2].unwrap() + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_close_returns_zero_prior_close() {
        let bars = bars_from_closes(&[0.0, 5.0]);
        let returns = calculate_close_returns(&bars);
        assert_eq!(returns, vec![None, None]);
    }

    #[test]
    fn test_direction_labels() {
        let bars = bars_from_closes(&[10.0, 11.0, 9.0, 9.0, 12.0]);
        let labels = calculate_direction_labels(&bars);
        // up -> 0, down -> 1, flat -> 1, up -> 0, last unlabeled
        assert_eq!(labels, vec![Some(0), Some(1), Some(1), Some(0), None]);
    }

    #[test]
    fn test_empty_input() {
        assert!(calculate_close_returns(&[]).is_empty());
        assert!(calculate_direction_labels(&[]).is_empty());
    }
}
