// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持法语（默认）和英语
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "fr";

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["fr", "en"];

/// 是否为支持的语言
pub fn is_supported_locale(locale: &str) -> bool {
    SUPPORTED_LOCALES.contains(&locale)
}

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"fr" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数，使用当前语言）
///
/// # 示例
/// ```no_run
/// use bakery_orders::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数，使用当前语言）
///
/// # 示例
/// ```no_run
/// use bakery_orders::i18n::t_with_args;
/// let msg = t_with_args("errors.not_found", &[("detail", "order 42")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key).to_string(), args)
}

/// 以指定语言翻译（不读写全局 locale，供消息生成等确定性场景使用）
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn fill_args(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
    // 为避免测试互相干扰，这里对 i18n 相关测试串行化。
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale(DEFAULT_LOCALE);
        assert_eq!(current_locale(), "fr");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("fr");
        assert_eq!(t("common.success"), "Opération réussie");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        let msg = t_with_args("errors.not_found", &[("detail", "order 42")]);
        assert!(msg.contains("order 42"));
        assert!(msg.starts_with("Not found"));
        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_supported_locales() {
        assert!(is_supported_locale("fr"));
        assert!(is_supported_locale("en"));
        assert!(!is_supported_locale("de"));
    }

    #[test]
    fn test_translate_in_explicit_locale() {
        assert_eq!(t_in("fr", "department.patiss", &[]), "Pâtisserie");
        assert_eq!(t_in("en", "department.patiss", &[]), "Pastry");
        assert_eq!(
            t_in("fr", "message.order_title", &[("supplier", "Moulin")]),
            "Commande Moulin"
        );
    }
}
