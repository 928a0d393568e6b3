//! Capping of an item list down to what is actually shown.
//!
//! [`FairRenderer`] is a stateless transform from a source's current items
//! to the sequence painted on screen.  It is re-run from scratch after every
//! reset of the source it is bound to.
//!
//! ## Fair-by-provider capping
//!
//! Items are grouped into one bucket per provider, in the order providers
//! first appear.  While more than `max_rendered` items remain, the last item
//! of the largest bucket is dropped; between equally large buckets the one
//! created first loses.  The buckets are then flattened in bucket order.
//!
//! The effect is that providers are evened out before anyone is trimmed
//! further, and no provider loses an item while a larger one still exists.
//! Grouping happens even when nothing is trimmed.

use clap::ValueEnum;

use crate::source::Item;

/// Which capping rule a renderer applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CappingPolicy {
    /// Balance the visible items across providers.
    #[default]
    FairByProvider,
    /// Keep the first `max_rendered` items in arrival order.
    FirstNTruncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub max_rendered: usize,
    pub policy: CappingPolicy,
}

#[derive(Debug, Clone)]
pub struct FairRenderer {
    config: RenderConfig,
}

impl FairRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Indices into `items` of the entries to paint, in paint order.
    pub fn render(&self, items: &[Item]) -> Vec<usize> {
        let max = self.config.max_rendered;
        match self.config.policy {
            CappingPolicy::FirstNTruncate => (0..items.len().min(max)).collect(),
            CappingPolicy::FairByProvider => fair_by_provider(items, max),
        }
    }
}

fn fair_by_provider(items: &[Item], max: usize) -> Vec<usize> {
    let mut buckets: Vec<(&str, Vec<usize>)> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match buckets.iter_mut().find(|(p, _)| *p == item.provider) {
            Some((_, bucket)) => bucket.push(i),
            None => buckets.push((item.provider.as_str(), vec![i])),
        }
    }

    let mut total = items.len();
    while total > max {
        let mut largest = 0;
        for (b, (_, bucket)) in buckets.iter().enumerate().skip(1) {
            // strict: ties stay with the earlier bucket
            if bucket.len() > buckets[largest].1.len() {
                largest = b;
            }
        }
        buckets[largest].1.pop();
        total -= 1;
    }

    buckets.into_iter().flat_map(|(_, bucket)| bucket).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn items(pairs: &[(&str, &str)]) -> Vec<Item> {
        pairs
            .iter()
            .map(|(p, text)| Item::suggestion(*p, *text))
            .collect()
    }

    fn fair(max: usize) -> FairRenderer {
        FairRenderer::new(RenderConfig {
            max_rendered: max,
            policy: CappingPolicy::FairByProvider,
        })
    }

    fn texts(renderer: &FairRenderer, items: &[Item]) -> Vec<String> {
        renderer
            .render(items)
            .into_iter()
            .filter_map(|i| items[i].suggestion_text())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn largest_bucket_is_trimmed_first() {
        let input = items(&[("x", "1"), ("x", "2"), ("x", "3"), ("y", "4")]);
        assert_eq!(texts(&fair(2), &input), ["1", "4"]);
    }

    #[test]
    fn ties_trim_the_earliest_provider() {
        let input = items(&[("x", "1"), ("y", "3"), ("x", "2"), ("y", "4")]);
        assert_eq!(texts(&fair(3), &input), ["1", "3", "4"]);
    }

    #[test]
    fn under_cap_is_regrouped_but_untrimmed() {
        let input = items(&[("x", "1"), ("y", "2"), ("x", "3"), ("z", "4"), ("y", "5")]);
        assert_eq!(texts(&fair(10), &input), ["1", "3", "2", "5", "4"]);
    }

    #[test]
    fn zero_cap_renders_nothing() {
        let input = items(&[("x", "1"), ("y", "2")]);
        assert!(fair(0).render(&input).is_empty());
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(fair(5).render(&[]).is_empty());
    }

    #[test]
    fn small_provider_survives_whole() {
        let input = items(&[
            ("a", "a1"),
            ("a", "a2"),
            ("a", "a3"),
            ("a", "a4"),
            ("b", "b1"),
            ("c", "c1"),
            ("c", "c2"),
            ("c", "c3"),
        ]);
        assert_eq!(texts(&fair(5), &input), ["a1", "a2", "b1", "c1", "c2"]);
    }

    #[test]
    fn first_n_keeps_arrival_order() {
        let input = items(&[("x", "1"), ("y", "2"), ("x", "3")]);
        let r = FairRenderer::new(RenderConfig {
            max_rendered: 2,
            policy: CappingPolicy::FirstNTruncate,
        });
        assert_eq!(texts(&r, &input), ["1", "2"]);
    }

    #[test]
    fn policy_names_match_cli_values() {
        let names: Vec<_> = CappingPolicy::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, ["fair-by-provider", "first-n-truncate"]);
    }

    fn arb_items() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec(0u8..5, 0..40).prop_map(|providers| {
            providers
                .into_iter()
                .enumerate()
                .map(|(i, p)| Item::suggestion(format!("p{p}"), i.to_string()))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn output_length_is_min_of_total_and_cap(input in arb_items(), max in 0usize..30) {
            let out = fair(max).render(&input);
            prop_assert_eq!(out.len(), input.len().min(max));
        }

        #[test]
        fn each_bucket_keeps_a_prefix_in_order(input in arb_items(), max in 0usize..30) {
            let out = fair(max).render(&input);
            let mut kept: HashMap<&str, Vec<usize>> = HashMap::new();
            for &i in &out {
                kept.entry(input[i].provider.as_str()).or_default().push(i);
            }
            for (provider, indices) in kept {
                let original: Vec<usize> = input
                    .iter()
                    .enumerate()
                    .filter(|(_, it)| it.provider == provider)
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(&original[..indices.len()], &indices[..]);
            }
        }

        #[test]
        fn trimmed_buckets_are_within_one_of_the_largest(input in arb_items(), max in 0usize..30) {
            let out = fair(max).render(&input);
            let mut original: HashMap<&str, usize> = HashMap::new();
            for it in &input {
                *original.entry(it.provider.as_str()).or_default() += 1;
            }
            let mut shown: HashMap<&str, usize> = HashMap::new();
            for &i in &out {
                *shown.entry(input[i].provider.as_str()).or_default() += 1;
            }
            let largest = shown.values().copied().max().unwrap_or(0);
            for (provider, n) in original {
                let kept = shown.get(provider).copied().unwrap_or(0);
                if kept < n {
                    prop_assert!(kept + 1 >= largest, "{provider}: kept {kept}, largest {largest}");
                }
            }
        }

        #[test]
        fn output_is_grouped_in_first_appearance_order(input in arb_items(), max in 0usize..30) {
            let out = fair(max).render(&input);
            let mut seen: Vec<&str> = Vec::new();
            for &i in &out {
                let p = input[i].provider.as_str();
                if seen.last() != Some(&p) {
                    prop_assert!(!seen.contains(&p), "provider {p} split into two runs");
                    seen.push(p);
                }
            }
            let first_seen: Vec<&str> = input.iter().fold(Vec::new(), |mut acc, it| {
                if !acc.contains(&it.provider.as_str()) {
                    acc.push(it.provider.as_str());
                }
                acc
            });
            let expected: Vec<&str> = first_seen.into_iter().filter(|p| seen.contains(p)).collect();
            prop_assert_eq!(seen, expected);
        }
    }
}
