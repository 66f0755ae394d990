//! Generators every new save starts with.

use super::logic::ProductionEngine;

pub struct GeneratorDef {
    pub id: &'static str,
    pub base_production: f64,
    pub base_cost: f64,
    pub description: &'static str,
}

pub const STARTER_ROSTER: &[GeneratorDef] = &[
    GeneratorDef {
        id: "auto_clicker",
        base_production: 1.0,
        base_cost: 15.0,
        description: "Clicks once per second so you don't have to",
    },
    GeneratorDef {
        id: "card_shop",
        base_production: 5.0,
        base_cost: 100.0,
        description: "A small shop trading spare cards",
    },
    GeneratorDef {
        id: "card_factory",
        base_production: 20.0,
        base_cost: 1100.0,
        description: "Prints fresh cards on an assembly line",
    },
    GeneratorDef {
        id: "trading_guild",
        base_production: 100.0,
        base_cost: 12000.0,
        description: "Runs card auctions across the realm",
    },
];

/// Register every starter generator the engine does not have yet. Returns
/// how many were added.
pub fn bootstrap_roster(engine: &mut ProductionEngine) -> usize {
    STARTER_ROSTER
        .iter()
        .filter(|def| {
            engine.add_generator(def.id, def.base_production, def.base_cost, def.description)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::EventBus;

    #[test]
    fn test_bootstrap_adds_all_once() {
        let mut engine = ProductionEngine::new(EventBus::new());
        assert_eq!(bootstrap_roster(&mut engine), STARTER_ROSTER.len());
        assert_eq!(bootstrap_roster(&mut engine), 0);
        assert!(engine.generators().iter().all(|g| g.level == 0));
        assert_eq!(engine.aggregate_production(), 0.0);
    }

    #[test]
    fn test_roster_costs_increase() {
        for pair in STARTER_ROSTER.windows(2) {
            assert!(pair[0].base_cost < pair[1].base_cost);
            assert!(pair[0].base_production < pair[1].base_production);
        }
    }
}
