use serde::{Deserialize, Serialize};

/// City code of the "inside" delivery zone.
pub const INSIDE_CITY: u32 = 1;

const INSIDE_BASE_FEE: f64 = 60.0;
const OUTSIDE_BASE_FEE: f64 = 100.0;
const HALF_TO_ONE_KG_SURCHARGE: f64 = 10.0;
const PER_EXTRA_KG_FEE: f64 = 15.0;
const COD_RATE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    pub delivery_fee: f64,
    pub cod_fee: f64,
    pub total_fee: f64,
}

/// Computes delivery, cash-on-delivery and total fees for a parcel.
///
/// Weight is priced in tiers: up to 0.5 kg pays the zone base fee, up to
/// 1 kg adds a flat surcharge, and every started kilogram above 1 kg adds
/// `PER_EXTRA_KG_FEE`. The COD fee is 1% of the amount to collect and is
/// not rounded.
pub fn compute_fees(item_weight: f64, recipient_city: u32, amount_to_collect: i64) -> Fees {
    let base_fee = if recipient_city == INSIDE_CITY {
        INSIDE_BASE_FEE
    } else {
        OUTSIDE_BASE_FEE
    };

    let delivery_fee = if item_weight <= 0.5 {
        base_fee
    } else if item_weight <= 1.0 {
        base_fee + HALF_TO_ONE_KG_SURCHARGE
    } else {
        let extra_weight = (item_weight - 1.0).ceil();
        base_fee + HALF_TO_ONE_KG_SURCHARGE + PER_EXTRA_KG_FEE * extra_weight
    };

    let cod_fee = amount_to_collect as f64 * COD_RATE;

    Fees {
        delivery_fee,
        cod_fee,
        total_fee: delivery_fee + cod_fee,
    }
}
