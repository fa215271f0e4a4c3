//! 計測・スモークテスト用の合成コーパス。
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::store::CorpusDataset;
use crate::store::models::{ItemId, ItemRecord, TagApplication, TagId, TagRecord};
use crate::tagmap::CorpusSnapshot;

const THEMES: [&str; 10] = [
    "aim", "stream", "tech", "reading", "finger", "alt", "gimmick", "slider", "farm", "spaced",
];
const MAPPERS: [&str; 8] = [
    "Sotarks", "Nevo", "Monstrata", "Cheri", "Akitoshi", "Sing", "Kert", "Rolniczy",
];
const CLUSTER_WIDTH: usize = 6;

/// クラスタ構造を持つ合成データセットを生成する。
///
/// タグは `CLUSTER_WIDTH` 個ずつのクラスタに分かれ、各アイテムは1つのクラスタから
/// 数個のタグを受け取る。少量のノイズタグと否定行も混ぜる。シードが同じなら結果も同じ。
///
/// # Arguments
/// * `items` - アイテム数
/// * `tags` - タグ数（最低 `CLUSTER_WIDTH`）
/// * `seed` - 乱数シード
#[must_use]
pub fn synthetic_dataset(items: usize, tags: usize, seed: u64) -> CorpusDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let tags = tags.max(CLUSTER_WIDTH);
    let clusters = tags.div_ceil(CLUSTER_WIDTH);

    let tag_records: Vec<TagRecord> = (0..tags)
        .map(|index| TagRecord {
            id: tag_id(index),
            name: format!(
                "{}/{}",
                THEMES[(index / CLUSTER_WIDTH) % THEMES.len()],
                index
            ),
            namespace: "osu".to_string(),
        })
        .collect();

    let mut applications = Vec::new();
    let mut item_records = Vec::with_capacity(items);
    for offset in 0..items {
        let item: ItemId = i64::try_from(offset).unwrap_or(i64::MAX - 1) + 1;
        let cluster = rng.random_range(0..clusters);
        let first = cluster * CLUSTER_WIDTH;
        let last = (first + CLUSTER_WIDTH).min(tags);

        let mut assigned = false;
        for index in first..last {
            if rng.random_bool(0.6) {
                applications.push(application(&mut rng, item, tag_id(index)));
                assigned = true;
            }
        }
        if !assigned {
            applications.push(application(&mut rng, item, tag_id(first)));
        }
        if rng.random_bool(0.3) {
            let noise = rng.random_range(0..tags);
            applications.push(application(&mut rng, item, tag_id(noise)));
        }
        if rng.random_bool(0.05) {
            let negative = rng.random_range(0..tags);
            applications.push(TagApplication {
                is_negative: true,
                ..TagApplication::by_contributor(item, tag_id(negative), 1)
            });
        }

        item_records.push(ItemRecord {
            id: item,
            status: status(&mut rng).to_string(),
            attribution: attribution(&mut rng, cluster),
        });
    }

    CorpusDataset {
        applications,
        tags: tag_records,
        items: item_records,
    }
}

/// [`synthetic_dataset`] の適用行をそのままスナップショットにする（ステータス無視）。
#[must_use]
pub fn synthetic_corpus(items: usize, tags: usize, seed: u64) -> CorpusSnapshot {
    let dataset = synthetic_dataset(items, tags, seed);
    CorpusSnapshot::from_applications(&dataset.applications)
}

fn tag_id(index: usize) -> TagId {
    i64::try_from(index).unwrap_or(i64::MAX - 1) + 1
}

fn application(rng: &mut StdRng, item: ItemId, tag: TagId) -> TagApplication {
    if rng.random_bool(0.1) {
        TagApplication::predicted(item, tag)
    } else {
        TagApplication::by_contributor(item, tag, rng.random_range(1..=50))
    }
}

fn status(rng: &mut StdRng) -> &'static str {
    match rng.random_range(0..20) {
        0..=11 => "Ranked",
        12..=13 => "Approved",
        14..=16 => "Loved",
        _ => "Graveyard",
    }
}

/// クラスタごとに常連のマッパーを置き、ときどき合作や空欄を混ぜる。
fn attribution(rng: &mut StdRng, cluster: usize) -> String {
    let regular = MAPPERS[cluster % MAPPERS.len()];
    match rng.random_range(0..10) {
        0 => String::new(),
        1 | 2 => {
            let guest = MAPPERS[rng.random_range(0..MAPPERS.len())];
            format!("{regular}, {guest}")
        }
        3 | 4 => MAPPERS[rng.random_range(0..MAPPERS.len())].to_string(),
        _ => regular.to_string(),
    }
}
