use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DealCalcError;
use crate::types::{Money, Percent};
use crate::DealCalcResult;

/// Most scenarios that can be compared side by side.
pub const MAX_SCENARIOS: usize = 3;
/// Longest loan term accepted, in years.
pub const MAX_TERM_YEARS: u32 = 100;

/// How the acquisition is financed.
///
/// Only `Loan` scenarios carry debt service; `Cash` and `Hybrid` still report
/// the loan amount implied by their loan percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinancingType {
    #[default]
    Loan,
    Cash,
    Hybrid,
}

impl FinancingType {
    pub fn carries_debt_service(self) -> bool {
        matches!(self, FinancingType::Loan)
    }
}

impl std::fmt::Display for FinancingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FinancingType::Loan => "Loan",
            FinancingType::Cash => "Cash",
            FinancingType::Hybrid => "Hybrid",
        };
        f.write_str(label)
    }
}

/// A single financing scenario. Percentages are entered as 7.0 = 7%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub id: u32,
    #[serde(rename = "type")]
    pub financing_type: FinancingType,
    /// Share of project cost funded by the loan
    pub loan_percent: Percent,
    /// Share of project cost paid as down payment
    pub down_payment_percent: Percent,
    /// Annual interest rate
    pub rate: Percent,
    /// Loan term in years
    pub term: u32,
    /// Cash required on top of the down payment
    pub additional_startup: Money,
    /// LP equity actually raised for this scenario
    pub adjusted_raise: Money,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            id: 1,
            financing_type: FinancingType::Loan,
            loan_percent: dec!(75.0),
            down_payment_percent: dec!(25.0),
            rate: dec!(7.0),
            term: 25,
            additional_startup: dec!(5000.0),
            adjusted_raise: dec!(175000.0),
        }
    }
}

impl Scenario {
    /// Default scenario template with the given id.
    pub fn with_id(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Reject out-of-range inputs; push warnings for inconsistent ones.
    pub fn validate(&self, warnings: &mut Vec<String>) -> DealCalcResult<()> {
        check_percent(&format!("scenarios[{}].loan_percent", self.id), self.loan_percent)?;
        check_percent(
            &format!("scenarios[{}].down_payment_percent", self.id),
            self.down_payment_percent,
        )?;
        check_percent(&format!("scenarios[{}].rate", self.id), self.rate)?;

        if self.financing_type.carries_debt_service() && self.term == 0 {
            return Err(DealCalcError::InvalidInput {
                field: format!("scenarios[{}].term", self.id),
                reason: "Loan term must be at least 1 year".into(),
            });
        }
        if self.term > MAX_TERM_YEARS {
            return Err(DealCalcError::InvalidInput {
                field: format!("scenarios[{}].term", self.id),
                reason: format!("Loan term cannot exceed {MAX_TERM_YEARS} years"),
            });
        }
        if self.additional_startup < Decimal::ZERO {
            return Err(DealCalcError::InvalidInput {
                field: format!("scenarios[{}].additional_startup", self.id),
                reason: "Additional startup cannot be negative".into(),
            });
        }
        if self.adjusted_raise < Decimal::ZERO {
            return Err(DealCalcError::InvalidInput {
                field: format!("scenarios[{}].adjusted_raise", self.id),
                reason: "Adjusted raise cannot be negative".into(),
            });
        }

        let total = self.loan_percent + self.down_payment_percent;
        if (total - Decimal::ONE_HUNDRED).abs() > dec!(0.01) {
            warnings.push(format!(
                "Scenario {}: Loan % ({:.2}%) + Down Payment % ({:.2}%) ≠ 100%",
                self.id, self.loan_percent, self.down_payment_percent
            ));
        }

        Ok(())
    }
}

pub(crate) fn check_percent(field: &str, value: Percent) -> DealCalcResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(DealCalcError::InvalidInput {
            field: field.into(),
            reason: format!("{value} must be between 0 and 100"),
        });
    }
    Ok(())
}

/// Up to [`MAX_SCENARIOS`] scenarios, in creation order.
///
/// Ids are assigned from a counter that never goes backwards, so a removed
/// scenario's id is not reused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Scenario>", into = "Vec<Scenario>")]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
    next_id: u32,
}

impl ScenarioSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding `count` default scenarios (capped at [`MAX_SCENARIOS`]).
    pub fn with_defaults(count: usize) -> DealCalcResult<Self> {
        let mut set = Self::new();
        for _ in 0..count {
            set.add()?;
        }
        Ok(set)
    }

    /// Append a default scenario and return its id.
    pub fn add(&mut self) -> DealCalcResult<u32> {
        if self.scenarios.len() >= MAX_SCENARIOS {
            return Err(DealCalcError::ScenarioLimit { max: MAX_SCENARIOS });
        }
        self.next_id += 1;
        let id = self.next_id;
        self.scenarios.push(Scenario::with_id(id));
        Ok(id)
    }

    /// Remove a scenario. The last remaining scenario cannot be removed.
    pub fn remove(&mut self, id: u32) -> DealCalcResult<Scenario> {
        let idx = self
            .scenarios
            .iter()
            .position(|s| s.id == id)
            .ok_or(DealCalcError::ScenarioNotFound(id))?;
        if self.scenarios.len() == 1 {
            return Err(DealCalcError::InvalidInput {
                field: "scenarios".into(),
                reason: "At least one scenario must remain".into(),
            });
        }
        Ok(self.scenarios.remove(idx))
    }

    pub fn get(&self, id: u32) -> DealCalcResult<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.id == id)
            .ok_or(DealCalcError::ScenarioNotFound(id))
    }

    pub fn get_mut(&mut self, id: u32) -> DealCalcResult<&mut Scenario> {
        self.scenarios
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(DealCalcError::ScenarioNotFound(id))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl<'a> IntoIterator for &'a ScenarioSet {
    type Item = &'a Scenario;
    type IntoIter = std::slice::Iter<'a, Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.iter()
    }
}

impl TryFrom<Vec<Scenario>> for ScenarioSet {
    type Error = DealCalcError;

    fn try_from(scenarios: Vec<Scenario>) -> Result<Self, Self::Error> {
        if scenarios.len() > MAX_SCENARIOS {
            return Err(DealCalcError::ScenarioLimit { max: MAX_SCENARIOS });
        }
        for (i, s) in scenarios.iter().enumerate() {
            if scenarios[..i].iter().any(|prev| prev.id == s.id) {
                return Err(DealCalcError::InvalidInput {
                    field: "scenarios".into(),
                    reason: format!("Duplicate scenario id {}", s.id),
                });
            }
        }
        let next_id = scenarios.iter().map(|s| s.id).max().unwrap_or(0);
        Ok(Self { scenarios, next_id })
    }
}

impl From<ScenarioSet> for Vec<Scenario> {
    fn from(set: ScenarioSet) -> Self {
        set.scenarios
    }
}
