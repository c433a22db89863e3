//! Integration tests driving the shiprail binary against scratch repositories

mod helpers;
mod test_changelog;
mod test_inspect;
mod test_release;
mod test_sync;
