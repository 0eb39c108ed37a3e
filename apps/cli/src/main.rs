fn main() -> anyhow::Result<()> {
    deckhand_cli::run()
}
