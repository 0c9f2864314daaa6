fn main() {
    stagehand::app::run();
}
