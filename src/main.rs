fn main() {
    earnings_analyzer_lib::run()
}
