//! Disjoint item-to-component assignment.

use crate::store::models::ItemId;

use super::candidates::CandidateSet;
use super::components::Component;

/// log が 0 に近いときの下限。
const MIN_LOG_SUPPORT: f64 = 1e-6;

/// 逆対数サポート重み。希少なタグほど重い。
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tag_weight(support: usize) -> f64 {
    1.0 / (2.0 + support as f64).ln().max(MIN_LOG_SUPPORT)
}

/// 各アイテムをちょうど1つのコンポーネントに割り当てる。
///
/// 戻り値は `components` と同じ順序のアイテム列。候補タグを持たないアイテム、
/// および `components` に含まれないタグしか持たないアイテムはどこにも入らない。
/// スコアが完全に同点の場合はインデックスの小さいコンポーネントが勝つ。
#[must_use]
pub fn assign_items(
    memberships: &[(ItemId, Vec<usize>)],
    components: &[Component],
    candidates: &CandidateSet,
) -> Vec<Vec<ItemId>> {
    let mut owner: Vec<Option<usize>> = vec![None; candidates.len()];
    for (component_idx, component) in components.iter().enumerate() {
        for &tag in &component.members {
            if let Some(slot) = owner.get_mut(tag) {
                *slot = Some(component_idx);
            }
        }
    }
    let weights: Vec<f64> = candidates
        .tags()
        .iter()
        .map(|tag| tag_weight(tag.support))
        .collect();

    let mut assigned: Vec<Vec<ItemId>> = vec![Vec::new(); components.len()];
    let mut scores: Vec<f64> = vec![0.0; components.len()];
    let mut touched: Vec<usize> = Vec::new();

    for (item, tags) in memberships {
        for &tag in tags {
            let Some(component_idx) = owner.get(tag).copied().flatten() else {
                continue;
            };
            if !touched.contains(&component_idx) {
                touched.push(component_idx);
            }
            scores[component_idx] += weights[tag];
        }
        if touched.is_empty() {
            continue;
        }

        touched.sort_unstable();
        let mut best = touched[0];
        for &component_idx in &touched[1..] {
            if scores[component_idx] > scores[best] {
                best = component_idx;
            }
        }
        assigned[best].push(*item);

        for component_idx in touched.drain(..) {
            scores[component_idx] = 0.0;
        }
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagmap::candidates::CandidateTag;

    fn candidates(supports: &[usize]) -> CandidateSet {
        CandidateSet::new(
            supports
                .iter()
                .enumerate()
                .map(|(idx, support)| CandidateTag {
                    tag_id: i64::try_from(idx).expect("small index"),
                    support: *support,
                })
                .collect(),
        )
    }

    fn component(members: Vec<usize>, mass: usize) -> Component {
        Component { members, mass }
    }

    #[test]
    fn rarer_tags_weigh_more() {
        assert!(tag_weight(3) > tag_weight(300));
        assert!(tag_weight(0).is_finite());
    }

    #[test]
    fn each_item_lands_in_exactly_one_component() {
        let set = candidates(&[100, 90, 5, 4]);
        let components = vec![component(vec![0, 1], 190), component(vec![2, 3], 9)];
        let memberships = vec![
            (1, vec![0, 1]),
            (2, vec![2, 3]),
            // 0 単独より 2+3 の希少タグ 2 つが勝つ
            (3, vec![0, 2, 3]),
            (4, vec![1]),
        ];
        let assigned = assign_items(&memberships, &components, &set);
        assert_eq!(assigned[0], vec![1, 4]);
        assert_eq!(assigned[1], vec![2, 3]);
        let total: usize = assigned.iter().map(Vec::len).sum();
        assert_eq!(total, memberships.len());
    }

    #[test]
    fn exact_ties_go_to_the_earlier_component() {
        let set = candidates(&[10, 10]);
        let components = vec![component(vec![0], 10), component(vec![1], 10)];
        let assigned = assign_items(&[(7, vec![0, 1])], &components, &set);
        assert_eq!(assigned[0], vec![7]);
        assert!(assigned[1].is_empty());
    }

    #[test]
    fn tags_outside_kept_components_are_ignored() {
        let set = candidates(&[10, 8, 6]);
        // タグ2 のコンポーネントは切り捨て済み
        let components = vec![component(vec![0, 1], 18)];
        let assigned = assign_items(&[(1, vec![2]), (2, vec![1, 2])], &components, &set);
        assert_eq!(assigned, vec![vec![2]]);
    }
}
