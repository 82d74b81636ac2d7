fn main() {
    codetrend_lib::run()
}
