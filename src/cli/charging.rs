//! Charging session arguments.

use std::{fmt::Debug, ops::RangeInclusive};

use clap::Parser;

use crate::{
    prelude::*,
    quantity::{Quantity, energy::KilowattHours, power::Kilowatts, rate::KilowattHourRate},
};

/// Tapering towards a full battery slows the charging down.
const FULL_CHARGE_POWER_FACTOR: f64 = 0.85;

const DEFAULT_CHARGING_POWER: Kilowatts = Quantity(11.0);
const DEFAULT_TARGET_ENERGY: KilowattHours = Quantity(45.0);
const DEFAULT_MARGIN: KilowattHourRate = Quantity(0.003);

const CHARGING_POWER_RANGE: RangeInclusive<Kilowatts> = Quantity(3.0)..=Quantity(22.0);
const TARGET_ENERGY_RANGE: RangeInclusive<KilowattHours> = Quantity(5.0)..=Quantity(120.0);
const MARGIN_RANGE: RangeInclusive<KilowattHourRate> = Quantity(0.0)..=Quantity(0.0056);

#[must_use]
#[derive(Copy, Clone, Parser)]
pub struct ChargingArgs {
    /// Nominal charging power in kilowatts.
    #[clap(long = "charging-power-kilowatts", default_value = "11", env = "CHARGING_POWER_KILOWATTS")]
    pub charging_power: Kilowatts,

    /// Energy to charge in kilowatt-hours.
    #[clap(long = "target-energy-kilowatt-hours", default_value = "45", env = "TARGET_ENERGY_KILOWATT_HOURS")]
    pub target_energy: KilowattHours,

    /// Electricity retailer margin on top of the spot price, per kilowatt-hour.
    #[clap(long = "margin-per-kwh", default_value = "0.003", env = "MARGIN_PER_KWH")]
    pub margin: KilowattHourRate,

    /// Electricity tax («sähkövero») per kilowatt-hour.
    #[clap(long = "tax-per-kwh", default_value = "0.027", env = "TAX_PER_KWH")]
    pub tax: KilowattHourRate,

    /// Charge up to 100%: the power drops towards the end of the session.
    #[clap(long, env = "FULL_CHARGE")]
    pub full_charge: bool,

    /// Include the demand fee («tehomaksu») in the total cost.
    #[clap(long, env = "DEMAND_FEE")]
    pub demand_fee: bool,
}

/// Sanitized charging parameters.
#[derive(Copy, Clone, Debug)]
pub struct Charging {
    /// Effective charging power.
    pub power: Kilowatts,

    pub target_energy: KilowattHours,
    pub margin: KilowattHourRate,
    pub tax: KilowattHourRate,
    pub include_demand_fee: bool,
}

impl ChargingArgs {
    /// Bring the arguments into the supported ranges, and apply the full-charge derating.
    pub fn sanitize(&self) -> Charging {
        let nominal_power = sanitize(
            "charging power",
            self.charging_power,
            DEFAULT_CHARGING_POWER,
            CHARGING_POWER_RANGE,
        );
        let power =
            if self.full_charge { nominal_power * FULL_CHARGE_POWER_FACTOR } else { nominal_power };
        let charging = Charging {
            power,
            target_energy: sanitize(
                "target energy",
                self.target_energy,
                DEFAULT_TARGET_ENERGY,
                TARGET_ENERGY_RANGE,
            ),
            margin: sanitize("margin", self.margin, DEFAULT_MARGIN, MARGIN_RANGE),
            tax: self.tax,
            include_demand_fee: self.demand_fee,
        };
        debug!(?charging, "sanitized");
        charging
    }
}

fn sanitize<const POWER: isize, const TIME: isize, const COST: isize>(
    name: &str,
    value: Quantity<POWER, TIME, COST>,
    default: Quantity<POWER, TIME, COST>,
    range: RangeInclusive<Quantity<POWER, TIME, COST>>,
) -> Quantity<POWER, TIME, COST>
where
    Quantity<POWER, TIME, COST>: Debug,
{
    if !value.is_finite() {
        warn!(name, ?value, ?default, "not a number, using the default");
        return default;
    }
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!(name, ?value, ?clamped, "out of the supported range");
    }
    clamped
}
