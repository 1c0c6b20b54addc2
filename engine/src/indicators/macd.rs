// Moving Average Convergence Divergence (MACD) helpers
use super::ema::exponential_mean;

/// `fast - slow`, element by element.
pub fn macd_line(fast: &[f64], slow: &[f64]) -> Vec<f64> {
    fast.iter().zip(slow).map(|(f, s)| f - s).collect()
}

/// Exponential mean of the MACD line.
pub fn signal_line(macd: &[f64], span: usize) -> Vec<f64> {
    exponential_mean(macd, span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_line() {
        assert_eq!(macd_line(&[3.0, 5.0], &[1.0, 6.0]), vec![2.0, -1.0]);
    }

    #[test]
    fn test_signal_line_follows_macd() {
        let signal = signal_line(&[0.0, 1.0, 1.0], 9); // k = 0.2
        assert_eq!(signal[0], 0.0);
        assert!((signal[1] - 0.2).abs() < 1e-12);
        assert!((signal[2] - 0.36).abs() < 1e-12);
    }
}
