//! monkeyc binary entry point.

fn main() -> anyhow::Result<()> {
    monkeyc::run()
}
