use std::collections::BTreeSet;

use crate::*;

#[derive(Debug, Clone)]
struct ResolvedOrder {
    config: OrderConfig,
    abilities: BTreeSet<u32>,
    groups: GroupFilter,
    max_counts: Vec<i64>,
}

impl ResolvedOrder {
    fn labels(&self, prefix: &str, side: Side) -> Vec<String> {
        self.groups
            .labels()
            .map(|g| format!("{}{}_{}_{}", prefix, self.config.name, side, g))
            .collect()
    }

    /// For each group, how many of its units are executing one of the
    /// configured abilities, or `None` if the group has no units.
    fn executing(&self, obs: &Observation, side: Side) -> Vec<Option<usize>> {
        self.groups
            .iter()
            .map(|(_, types)| {
                let mut units = obs.group_units(side, types).peekable();
                units.peek()?;
                Some(
                    units
                        .filter(|unit| {
                            unit.active_orders()
                                .iter()
                                .any(|order| self.abilities.contains(order))
                        })
                        .count(),
                )
            })
            .collect()
    }
}

/// Detects groups of one side carrying out any of a set of orders.
#[derive(Debug, Clone)]
pub struct OrdersExtractor {
    output: OutputModes,
    side: Side,
    orders: Vec<ResolvedOrder>,
}

impl OrdersExtractor {
    pub fn new(config: &FeatureExtractorConfig, side: Side) -> FeatureExtractorResult<Self> {
        let section = config.orders()?;
        let max_units = config.max_units_by_type(side)?;
        let orders = match side {
            Side::Friendly => &section.friendly,
            Side::Enemy => &section.enemy,
        };
        let orders = orders
            .iter()
            .map(|order| {
                let groups = config.resolve_filter(&order.unit_group_filter)?;
                Ok(ResolvedOrder {
                    abilities: order.raw_abilities.iter().copied().collect(),
                    max_counts: groups.max_counts(&max_units),
                    groups,
                    config: order.clone(),
                })
            })
            .collect::<FeatureExtractorResult<Vec<_>>>()?;
        Ok(Self {
            output: section.output,
            side,
            orders,
        })
    }
}

impl FeatureExtractor for OrdersExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(self.orders.iter().flat_map(|o| o.labels("", self.side)));
        }
        if self.output.numeric {
            labels.extend(
                self.orders
                    .iter()
                    .flat_map(|o| o.labels("Number", self.side)),
            );
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                self.orders
                    .iter()
                    .flat_map(|o| o.labels("", self.side))
                    .map(FeatureDescriptor::boolean),
            );
        }
        if self.output.numeric {
            for order in self.orders.iter() {
                descriptors.extend(
                    order
                        .labels("Number", self.side)
                        .into_iter()
                        .zip(order.max_counts.iter())
                        .map(|(label, max)| FeatureDescriptor::integer(label, 0, *max)),
                );
            }
        }
        descriptors
    }

    fn add_features(&mut self, _step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let executing: Vec<Vec<Option<usize>>> = self
            .orders
            .iter()
            .map(|order| order.executing(obs, self.side))
            .collect();

        if self.output.categorical {
            row.extend(executing.iter().flatten().map(|count| {
                count.map_or(FeatureValue::Undefined, |n| FeatureValue::Bool(n > 0))
            }));
        }
        if self.output.numeric {
            row.extend(executing.iter().flatten().map(|count| {
                count.map_or(FeatureValue::nan(), |n| FeatureValue::Int(n as i64))
            }));
        }
    }
}
