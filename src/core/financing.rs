/// Share of the house value covered by the mortgage, in percent. Zero when
/// there is no house value to compare against.
pub fn financed_percent(house_value: f64, principal: f64) -> f64 {
    if house_value != 0.0 {
        principal / house_value * 100.0
    } else {
        0.0
    }
}

pub fn principal_for_percent(house_value: f64, percent: f64) -> f64 {
    house_value * percent / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn financed_percent_of_default_house() {
        let percent = financed_percent(215_500.0, 140_000.0);
        assert!((percent - 64.965_197).abs() < 1e-5, "got {percent}");
    }

    #[test]
    fn financed_percent_without_house_value_is_zero() {
        assert_eq!(financed_percent(0.0, 140_000.0), 0.0);
    }

    #[test]
    fn principal_for_percent_inverts_financed_percent() {
        let percent = financed_percent(200_000.0, 150_000.0);
        assert_eq!(percent, 75.0);
        assert_eq!(principal_for_percent(200_000.0, percent), 150_000.0);
    }
}
