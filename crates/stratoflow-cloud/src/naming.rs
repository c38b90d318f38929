//! Random resource names for attributes left unset by the user

use rand::Rng;
use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "calm", "clever", "cosmic", "crisp", "eager", "fancy", "gentle",
    "happy", "jolly", "keen", "lively", "lucky", "mellow", "nimble", "proud", "quiet", "rapid",
    "shiny", "silent", "snowy", "sunny", "swift", "tidy", "vivid", "witty",
];

const NOUNS: &[&str] = &[
    "badger", "breeze", "canyon", "cloud", "comet", "dune", "falcon", "forest", "glacier",
    "harbor", "island", "lagoon", "meadow", "nebula", "otter", "panda", "pebble", "quasar",
    "river", "summit", "tiger", "tundra", "valley", "willow",
];

const SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// `<adjective>-<noun>-<4 alphanumerics>`, e.g. `swift-otter-k3x9`
pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("bold");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("cloud");
    let suffix: String = (0..4)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect();
    format!("{}-{}-{}", adjective, noun, suffix)
}
