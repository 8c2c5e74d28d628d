//! Fixed-point conversions and the venue's price discipline.
//!
//! Hyperliquid quotes prices and sizes as decimals but moves them on the
//! wire as scaled integers. Orders additionally constrain prices to five
//! significant figures and an asset-dependent number of decimal places.

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

/// Fixed-point exponent for order prices and sizes.
pub const WEI_DECIMALS: u32 = 8;

/// Fixed-point exponent for USDC amounts.
pub const USDC_DECIMALS: u32 = 6;

/// Scales a decimal into an unsigned fixed-point integer.
///
/// The fraction left over after scaling is truncated toward zero.
pub fn to_uint64(value: Decimal, decimals: u32) -> Result<u64> {
    if value < Decimal::ZERO {
        return Err(Error::validation(
            "amount",
            format!("must not be negative, got {value}"),
        ));
    }

    let factor = Decimal::from(10u64.pow(decimals));
    let scaled = value
        .checked_mul(factor)
        .ok_or_else(|| Error::validation("amount", format!("{value} overflows at {decimals} decimals")))?;

    scaled
        .trunc()
        .to_u64()
        .ok_or_else(|| Error::validation("amount", format!("{value} overflows at {decimals} decimals")))
}

/// Expands an unsigned fixed-point integer back into a decimal.
pub fn from_uint64(raw: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(raw as i128, decimals).normalize()
}

/// Rounds a price to what the exchange accepts.
///
/// Two constraints apply, the stricter winning: five significant figures,
/// and at most `6 - sz_decimals` (perps) or `8 - sz_decimals` (spot)
/// decimal places. Midpoint ties round away from zero. When the decimal
/// clamp would collapse a sub-tick price to zero, the significant-figure
/// rounding alone is kept.
pub fn round_price(px: Decimal, sz_decimals: u32, is_perp: bool) -> Result<Decimal> {
    if px <= Decimal::ZERO {
        return Err(Error::validation(
            "price",
            format!("must be positive, got {px}"),
        ));
    }

    let sig = round_significant(px, 5);

    let base = if is_perp { 6u32 } else { 8u32 };
    let max_decimals = base.saturating_sub(sz_decimals);
    let clamped = sig.round_dp_with_strategy(max_decimals, RoundingStrategy::MidpointAwayFromZero);

    if clamped.is_zero() {
        return Ok(sig.normalize());
    }
    Ok(clamped.normalize())
}

/// Rounds to `figures` significant digits, ties away from zero.
fn round_significant(value: Decimal, figures: u32) -> Decimal {
    // Position of the leading digit relative to the decimal point.
    let mut int_digits = 0i32;
    let mut probe = value.trunc();
    while probe >= Decimal::ONE {
        probe /= Decimal::TEN;
        int_digits += 1;
    }
    if int_digits == 0 {
        let mut probe = value;
        let mut first_digit_place = 0i32;
        while probe < Decimal::ONE {
            probe *= Decimal::TEN;
            first_digit_place += 1;
        }
        int_digits = 1 - first_digit_place;
    }

    let places = figures as i32 - int_digits;
    if places >= 0 {
        value.round_dp_with_strategy(places as u32, RoundingStrategy::MidpointAwayFromZero)
    } else {
        // Rounding left of the decimal point: shift, round, shift back.
        let shift = Decimal::from(10u64.pow(-places as u32));
        (value / shift).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * shift
    }
}

/// Worst acceptable price for a marketable order.
///
/// Buys pay up by `slippage`, sells give way by the same fraction.
pub fn slippage_px(mid: Decimal, is_buy: bool, slippage: Decimal) -> Result<Decimal> {
    if mid <= Decimal::ZERO {
        return Err(Error::validation(
            "mid",
            format!("mid price must be positive, got {mid}"),
        ));
    }
    if slippage < Decimal::ZERO || slippage >= Decimal::ONE {
        return Err(Error::validation(
            "slippage",
            format!("must be within [0, 1), got {slippage}"),
        ));
    }

    let factor = if is_buy {
        Decimal::ONE + slippage
    } else {
        Decimal::ONE - slippage
    };
    Ok(mid * factor)
}

/// Decodes a perp price from the mark/oracle precompiles.
///
/// Raw perp prices carry `6 - sz_decimals` implied decimals.
pub fn convert_perp_price(raw: u64, sz_decimals: u32) -> Result<Decimal> {
    if sz_decimals >= 6 {
        return Err(Error::validation(
            "sz_decimals",
            format!("perp sz_decimals must be below 6, got {sz_decimals}"),
        ));
    }
    Ok(from_uint64(raw, 6 - sz_decimals))
}

/// Decodes a spot price from the BBO/spot precompiles.
///
/// Raw spot prices carry `8 - base_sz_decimals` implied decimals; the
/// exponent goes negative for coarse tokens, in which case the raw value
/// is scaled up instead.
pub fn convert_spot_price(raw: u64, base_sz_decimals: u32) -> Decimal {
    if base_sz_decimals <= 8 {
        from_uint64(raw, 8 - base_sz_decimals)
    } else {
        let shift = Decimal::from(10u64.pow(base_sz_decimals - 8));
        (Decimal::from(raw) * shift).normalize()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn uint64_round_trips() {
        assert_eq!(to_uint64(dec!(65000), 8).unwrap(), 6_500_000_000_000);
        assert_eq!(to_uint64(dec!(0.1), 8).unwrap(), 10_000_000);
        assert_eq!(to_uint64(dec!(1.5), 6).unwrap(), 1_500_000);
        assert_eq!(to_uint64(Decimal::ZERO, 8).unwrap(), 0);

        assert_eq!(from_uint64(6_500_000_000_000, 8), dec!(65000));
        assert_eq!(from_uint64(10_000_000, 8), dec!(0.1));
    }

    #[test]
    fn uint64_truncates_excess_scale() {
        // 0.123456789 at 6 decimals keeps 123456, drops the rest.
        assert_eq!(to_uint64(dec!(0.123456789), 6).unwrap(), 123_456);
    }

    #[test]
    fn uint64_rejects_negative_and_overflow() {
        assert!(to_uint64(dec!(-1), 8).is_err());
        // 2e11 * 1e8 = 2e19 > u64::MAX
        assert!(to_uint64(dec!(200000000000), 8).is_err());
    }

    #[test]
    fn price_rounding_documentation_examples() {
        assert_eq!(round_price(dec!(1234.5), 3, true).unwrap(), dec!(1234.5));
        assert_eq!(round_price(dec!(1234.56), 3, true).unwrap(), dec!(1234.6));
        assert_eq!(round_price(dec!(123456), 3, true).unwrap(), dec!(123460));
        assert_eq!(round_price(dec!(1234.5678), 3, true).unwrap(), dec!(1234.6));
    }

    #[test]
    fn price_rounding_perp_decimal_caps() {
        assert_eq!(round_price(dec!(1.23456789), 0, true).unwrap(), dec!(1.2346));
        assert_eq!(round_price(dec!(1234.123456789), 0, true).unwrap(), dec!(1234.1));
        assert_eq!(round_price(dec!(12.3456789), 1, true).unwrap(), dec!(12.346));
        assert_eq!(round_price(dec!(123.456789), 2, true).unwrap(), dec!(123.46));
        assert_eq!(round_price(dec!(1.23456), 3, true).unwrap(), dec!(1.235));
        assert_eq!(round_price(dec!(1.2345), 4, true).unwrap(), dec!(1.23));
        assert_eq!(round_price(dec!(12345.678), 4, true).unwrap(), dec!(12346));
        assert_eq!(round_price(dec!(1.234), 5, true).unwrap(), dec!(1.2));
        assert_eq!(round_price(dec!(1234.56), 6, true).unwrap(), dec!(1235));
        assert_eq!(round_price(dec!(123456.78), 6, true).unwrap(), dec!(123460));
    }

    #[test]
    fn price_rounding_spot_decimal_caps() {
        assert_eq!(round_price(dec!(1.234567890123), 0, false).unwrap(), dec!(1.2346));
        assert_eq!(round_price(dec!(1.234567890123), 4, false).unwrap(), dec!(1.2346));
        assert_eq!(round_price(dec!(1.234567890123), 6, false).unwrap(), dec!(1.23));
        assert_eq!(round_price(dec!(1234.56), 8, false).unwrap(), dec!(1235));
    }

    #[test]
    fn price_rounding_eth_tick() {
        // sz_decimals = 4, so at most two decimal places.
        assert_eq!(round_price(dec!(4500.1), 4, true).unwrap(), dec!(4500.1));
        assert_eq!(round_price(dec!(4500.12), 4, true).unwrap(), dec!(4500.1));
        assert_eq!(round_price(dec!(3509.11), 4, true).unwrap(), dec!(3509.1));
        assert_eq!(round_price(dec!(4500.99), 4, true).unwrap(), dec!(4501));
        assert_eq!(round_price(dec!(45000.123), 4, true).unwrap(), dec!(45000));
        assert_eq!(round_price(dec!(450.12345), 4, true).unwrap(), dec!(450.12));
        assert_eq!(round_price(dec!(45.123), 4, true).unwrap(), dec!(45.12));
        assert_eq!(round_price(dec!(4.5678), 4, true).unwrap(), dec!(4.57));
    }

    #[test]
    fn price_rounding_btc_tick() {
        // sz_decimals = 5, so at most one decimal place.
        assert_eq!(round_price(dec!(11445), 5, true).unwrap(), dec!(11445));
        assert_eq!(round_price(dec!(11445.5), 5, true).unwrap(), dec!(11446));
        assert_eq!(round_price(dec!(11100.2), 5, true).unwrap(), dec!(11100));
        assert_eq!(round_price(dec!(100000), 5, true).unwrap(), dec!(100000));
        assert_eq!(round_price(dec!(99999.9), 5, true).unwrap(), dec!(100000));
        assert_eq!(round_price(dec!(12345.6), 5, true).unwrap(), dec!(12346));
        assert_eq!(round_price(dec!(12345.4), 5, true).unwrap(), dec!(12345));
        assert_eq!(round_price(dec!(123456.789), 5, true).unwrap(), dec!(123460));
        assert_eq!(round_price(dec!(1234.56), 5, true).unwrap(), dec!(1234.6));
        assert_eq!(round_price(dec!(123.456), 5, true).unwrap(), dec!(123.5));
    }

    #[test]
    fn price_rounding_significant_figures() {
        assert_eq!(round_price(dec!(12345.6), 3, true).unwrap(), dec!(12346));
        assert_eq!(round_price(dec!(123.456), 3, true).unwrap(), dec!(123.46));
        assert_eq!(round_price(dec!(12.3456), 3, true).unwrap(), dec!(12.346));
        assert_eq!(round_price(dec!(12345), 3, true).unwrap(), dec!(12345));
        assert_eq!(round_price(dec!(123.45), 3, true).unwrap(), dec!(123.45));
        assert_eq!(round_price(dec!(12.345), 3, true).unwrap(), dec!(12.345));
        // Midpoint at the decimal clamp rounds away from zero.
        assert_eq!(round_price(dec!(1.2345), 3, true).unwrap(), dec!(1.235));
        // Leading zeros do not count as significant digits.
        assert_eq!(round_price(dec!(0.123456), 0, true).unwrap(), dec!(0.12346));
        assert_eq!(round_price(dec!(0.123456), 3, true).unwrap(), dec!(0.123));
    }

    #[test]
    fn price_rounding_common_pairs() {
        assert_eq!(round_price(dec!(45000.00), 5, true).unwrap(), dec!(45000));
        assert_eq!(round_price(dec!(145000.55), 5, true).unwrap(), dec!(145000));
        assert_eq!(round_price(dec!(43210.5), 5, true).unwrap(), dec!(43211));
        assert_eq!(round_price(dec!(2500.50), 4, true).unwrap(), dec!(2500.5));
        assert_eq!(round_price(dec!(2345.67), 4, true).unwrap(), dec!(2345.7));
        assert_eq!(round_price(dec!(100.123), 3, true).unwrap(), dec!(100.12));
        assert_eq!(round_price(dec!(99.9999), 3, true).unwrap(), dec!(100));
        assert_eq!(round_price(dec!(10.1234), 3, true).unwrap(), dec!(10.123));
        assert_eq!(round_price(dec!(0.8765), 2, true).unwrap(), dec!(0.8765));
    }

    #[test]
    fn price_rounding_keeps_sub_tick_prices_alive() {
        // The decimal clamp would zero these; significant figures win.
        assert_eq!(round_price(dec!(0.00012345), 3, true).unwrap(), dec!(0.00012345));
        assert_eq!(
            round_price(dec!(0.000000123456), 3, true).unwrap(),
            dec!(0.00000012346)
        );
        // A huge integer keeps its magnitude.
        assert_eq!(round_price(dec!(1000000), 3, true).unwrap(), dec!(1000000));
    }

    #[test]
    fn price_rounding_rejects_non_positive() {
        let err = round_price(dec!(-100), 3, true).unwrap_err();
        assert!(err.to_string().contains("positive"));
        let err = round_price(Decimal::ZERO, 3, true).unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn slippage_adjusts_in_the_right_direction() {
        let mid = dec!(2500.123456);
        let buy = slippage_px(mid, true, dec!(0.05)).unwrap();
        let sell = slippage_px(mid, false, dec!(0.05)).unwrap();
        assert!(buy > mid && sell < mid);

        // Through the tick rounding these match the venue's accepted form.
        assert_eq!(round_price(buy, 4, true).unwrap(), dec!(2625.1));
        assert_eq!(round_price(sell, 4, true).unwrap(), dec!(2375.1));
        assert_eq!(
            round_price(slippage_px(dec!(45678.987654), true, dec!(0.03)).unwrap(), 5, true).unwrap(),
            dec!(47049)
        );
        assert_eq!(
            round_price(slippage_px(dec!(123.456789), true, dec!(0.10)).unwrap(), 3, true).unwrap(),
            dec!(135.8)
        );
    }

    #[test]
    fn slippage_validates_inputs() {
        assert!(slippage_px(Decimal::ZERO, true, dec!(0.05)).is_err());
        assert!(slippage_px(dec!(100), true, dec!(1)).is_err());
        assert!(slippage_px(dec!(100), true, dec!(-0.01)).is_err());
        assert!(slippage_px(dec!(100), true, Decimal::ZERO).is_ok());
    }

    #[test]
    fn precompile_price_decoding() {
        // ETH mark: raw 2500_00 with sz_decimals 4 -> 2 implied decimals.
        assert_eq!(convert_perp_price(250000, 4).unwrap(), dec!(2500));
        assert_eq!(convert_perp_price(250013, 4).unwrap(), dec!(2500.13));
        assert!(convert_perp_price(1, 6).is_err());

        assert_eq!(convert_spot_price(12345678, 0), dec!(0.12345678));
        assert_eq!(convert_spot_price(100, 8), dec!(100));
        assert_eq!(convert_spot_price(5, 10), dec!(500));
    }
}
