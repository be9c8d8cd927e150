//! Price Normalizer
//!
//! Turns raw venue observations into comparable USD prices. The on-chain
//! venue reports a Q64.96 square-root price: `sqrtPriceX96 = sqrt(token1 / token0) * 2^96`
//! in the tokens' smallest units, so decoding squares the value, removes the
//! `2^192` scale and shifts by the tokens' decimal difference.

use rust_decimal::Decimal;

use crate::error::{ArbitrageError, ArbitrageResult};
use crate::types::{NormalizedPrice, PriceObservation, SourceFormat, SqrtPriceEncoding};

/// 2^96
const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// Largest token decimals accepted in an encoding
const MAX_TOKEN_DECIMALS: u8 = 36;

/// Smallest price a `Decimal` holds without losing `f64` precision
const MIN_PRICE: f64 = 1e-10;

/// Normalize a raw observation into a USD price.
///
/// The decoded `f64` is carried into the `Decimal` bit for bit, so a plain USD
/// observation comes back as exactly the value it was read as.
///
/// Fails with [`ArbitrageError::NonPositivePrice`] when the raw value or the
/// decoded price is zero, negative or non-finite, with
/// [`ArbitrageError::PriceOutOfRange`] when a positive price lies outside
/// `[1e-10, Decimal::MAX]`, and with [`ArbitrageError::InvalidPriceFormat`]
/// when the encoding parameters are unusable.
pub fn normalize(observation: &PriceObservation) -> ArbitrageResult<NormalizedPrice> {
    let venue = observation.venue;
    let raw = observation.raw_value;

    if !raw.is_finite() || raw <= 0.0 {
        return Err(ArbitrageError::NonPositivePrice { venue, value: raw });
    }

    let decoded = match observation.source_format {
        SourceFormat::DecimalUsd => raw,
        SourceFormat::SqrtPriceX96(encoding) => decode_sqrt_price_x96(raw, &encoding)?,
    };

    if !decoded.is_finite() || decoded <= 0.0 {
        return Err(ArbitrageError::NonPositivePrice {
            venue,
            value: decoded,
        });
    }

    let out_of_range = || ArbitrageError::PriceOutOfRange {
        venue,
        value: decoded,
    };
    if decoded < MIN_PRICE {
        return Err(out_of_range());
    }
    let usd_price = Decimal::from_f64_retain(decoded).ok_or_else(out_of_range)?;

    Ok(NormalizedPrice { venue, usd_price })
}

/// Decode a pool `sqrtPriceX96` into the quote-per-base price.
///
/// With the base as token0 this is `raw² / 2^192 × 10^(base − quote)`;
/// otherwise the pool ratio is inverted.
pub fn decode_sqrt_price_x96(raw: f64, encoding: &SqrtPriceEncoding) -> ArbitrageResult<f64> {
    check_encoding(encoding)?;

    let sqrt_ratio = raw / Q96;
    let ratio = sqrt_ratio * sqrt_ratio;
    let scale = 10f64.powi(encoding.decimal_shift());

    Ok(if encoding.base_is_token0 {
        ratio * scale
    } else {
        scale / ratio
    })
}

/// Inverse of [`decode_sqrt_price_x96`]: the slot value a pool would hold
/// for a given quote-per-base price.
pub fn encode_sqrt_price_x96(price: f64, encoding: &SqrtPriceEncoding) -> ArbitrageResult<f64> {
    check_encoding(encoding)?;

    if !price.is_finite() || price <= 0.0 {
        return Err(ArbitrageError::InvalidInput(format!(
            "cannot encode price {price}"
        )));
    }

    let scale = 10f64.powi(encoding.decimal_shift());
    let ratio = if encoding.base_is_token0 {
        price / scale
    } else {
        scale / price
    };

    Ok(ratio.sqrt() * Q96)
}

fn check_encoding(encoding: &SqrtPriceEncoding) -> ArbitrageResult<()> {
    if encoding.base_decimals > MAX_TOKEN_DECIMALS || encoding.quote_decimals > MAX_TOKEN_DECIMALS {
        return Err(ArbitrageError::InvalidPriceFormat(format!(
            "token decimals {}/{} exceed {}",
            encoding.base_decimals, encoding.quote_decimals, MAX_TOKEN_DECIMALS
        )));
    }
    Ok(())
}
