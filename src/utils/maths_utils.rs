use rust_decimal::{Decimal, MathematicalOps};

/// Arithmetic mean. `None` for an empty slice.
#[inline]
pub(crate) fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    sum.checked_div(Decimal::from(values.len()))
}

/// Mean and population standard deviation, both exact up to the final square root.
#[inline]
pub(crate) fn mean_and_std_dev(values: &[Decimal]) -> Option<(Decimal, Decimal)> {
    let mean = mean(values)?;
    let squared: Vec<Decimal> = values
        .iter()
        .map(|value| {
            let diff = *value - mean;
            diff * diff
        })
        .collect();
    let variance = self::mean(&squared)?;
    Some((mean, variance.sqrt()?))
}

/// Mean absolute deviation around `centre`.
pub(crate) fn mean_abs_deviation(values: &[Decimal], centre: Decimal) -> Option<Decimal> {
    let deviations: Vec<Decimal> = values.iter().map(|v| (*v - centre).abs()).collect();
    mean(&deviations)
}

#[inline]
pub(crate) fn midpoint(a: Decimal, b: Decimal) -> Decimal {
    (a + b) / Decimal::TWO
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn population_std_dev_is_exact_for_square_variances() {
        // mean 5, squared diffs 9,1,1,1,0,0,4,16 -> variance 4
        let values: Vec<Decimal> = [2, 4, 4, 4, 5, 5, 7, 9].into_iter().map(d).collect();
        let (mean, sd) = mean_and_std_dev(&values).unwrap();
        assert_eq!(mean, d(5));
        assert_eq!(sd, d(2));
    }

    #[test]
    fn empty_inputs_have_no_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean_and_std_dev(&[]), None);
    }
}
