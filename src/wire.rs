//! Fixed-point wire codec.
//!
//! Every price and quantity crossing the system boundary travels as an exact
//! integer multiple of the contract's granularity. Floats exist only at the
//! human-display edge; a scaled value that would lose a fractional tick or
//! lot is a hard error, never a silent floor.

use crate::error::CashierError;
use crate::models::{Contract, ContractType};

/// How far from an integer a scaled float may sit and still count as one.
/// Covers binary-representation noise (1.23 * 100 = 122.999...) without
/// letting a genuine half-tick (1.005 * 100 = 100.4999...) sneak through.
const INTEGRALITY_EPSILON: f64 = 1e-6;

fn snap_to_integer(value: f64) -> Option<i64> {
    let snapped = value.round();
    if (value - snapped).abs() <= INTEGRALITY_EPSILON {
        Some(snapped as i64)
    } else {
        None
    }
}

fn denominated(contract: &Contract) -> Result<&Contract, CashierError> {
    contract
        .denominated_contract
        .as_deref()
        .ok_or_else(|| CashierError::ContractNotFound(format!("{} denominated", contract.ticker)))
}

fn payout(contract: &Contract) -> Result<&Contract, CashierError> {
    contract
        .payout_contract
        .as_deref()
        .ok_or_else(|| CashierError::ContractNotFound(format!("{} payout", contract.ticker)))
}

/// Scale a display price into its integer wire value.
pub fn price_to_wire(contract: &Contract, price: f64) -> Result<i64, CashierError> {
    let scaled = match contract.contract_type {
        ContractType::Prediction => price * contract.denominator as f64,
        _ => price * (denominated(contract)?.denominator * contract.denominator) as f64,
    };

    let wire = snap_to_integer(scaled)
        .ok_or_else(|| CashierError::non_integer_price(&contract.ticker, price))?;
    if wire % contract.tick_size != 0 {
        return Err(CashierError::non_integer_price(&contract.ticker, price));
    }
    Ok(wire)
}

/// Exact inverse of `price_to_wire`; no integrality constraint on the result.
pub fn price_from_wire(contract: &Contract, price: i64) -> Result<f64, CashierError> {
    match contract.contract_type {
        ContractType::Prediction => Ok(price as f64 / contract.denominator as f64),
        _ => Ok(price as f64 / (denominated(contract)?.denominator * contract.denominator) as f64),
    }
}

/// Scale a display quantity into its integer wire value.
///
/// Prediction quantities are already integral and pass through unchanged;
/// cash scales by the contract denominator; futures scale by the payout
/// contract's denominator and must land on a lot boundary.
pub fn quantity_to_wire(contract: &Contract, quantity: f64) -> Result<i64, CashierError> {
    match contract.contract_type {
        ContractType::Prediction => snap_to_integer(quantity)
            .ok_or_else(|| CashierError::non_integer_quantity(&contract.ticker, quantity)),
        ContractType::Cash => snap_to_integer(quantity * contract.denominator as f64)
            .ok_or_else(|| CashierError::non_integer_quantity(&contract.ticker, quantity)),
        ContractType::Futures => {
            let scaled = quantity * payout(contract)?.denominator as f64;
            let wire = snap_to_integer(scaled)
                .ok_or_else(|| CashierError::non_integer_quantity(&contract.ticker, quantity))?;
            if wire % contract.lot_size != 0 {
                return Err(CashierError::non_integer_quantity(&contract.ticker, quantity));
            }
            Ok(wire)
        }
    }
}

pub fn quantity_from_wire(contract: &Contract, quantity: i64) -> Result<f64, CashierError> {
    match contract.contract_type {
        ContractType::Prediction => Ok(quantity as f64),
        ContractType::Cash => Ok(quantity as f64 / contract.denominator as f64),
        ContractType::Futures => Ok(quantity as f64 / payout(contract)?.denominator as f64),
    }
}

/// Decimal places spanned by a numerator/denominator pair. Display only;
/// arithmetic never depends on this.
pub fn precision(numerator: i64, denominator: i64) -> u32 {
    if numerator <= denominator {
        0
    } else {
        (numerator as f64 / denominator as f64).log10().round() as u32
    }
}

pub fn price_precision(contract: &Contract) -> Result<u32, CashierError> {
    match contract.contract_type {
        ContractType::Prediction => Ok(precision(contract.denominator, contract.tick_size)),
        _ => Ok(precision(
            denominated(contract)?.denominator * contract.denominator,
            contract.tick_size,
        )),
    }
}

pub fn quantity_precision(contract: &Contract) -> Result<u32, CashierError> {
    match contract.contract_type {
        ContractType::Prediction => Ok(0),
        ContractType::Cash => Ok(precision(contract.denominator, contract.lot_size)),
        ContractType::Futures => Ok(precision(
            payout(contract)?.denominator,
            contract.lot_size,
        )),
    }
}

/// Format a wire price for logs and admin responses
pub fn price_fmt(contract: &Contract, price: i64) -> Result<String, CashierError> {
    let places = price_precision(contract)? as usize;
    Ok(format!("{:.*}", places, price_from_wire(contract, price)?))
}

/// Format a wire quantity for logs and admin responses
pub fn quantity_fmt(contract: &Contract, quantity: i64) -> Result<String, CashierError> {
    let places = quantity_precision(contract)? as usize;
    Ok(format!(
        "{:.*}",
        places,
        quantity_from_wire(contract, quantity)?
    ))
}
