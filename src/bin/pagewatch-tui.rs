fn main() -> anyhow::Result<()> {
    pagewatch::tui::run()
}
