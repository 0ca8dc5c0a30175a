//! Fingerprint output

use multilora_core::{fingerprint, AdapterSlots};

pub fn run(slots: &AdapterSlots) {
    println!("{}", fingerprint(slots));
}
