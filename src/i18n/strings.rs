//! Compiled-in UI chrome strings.
//!
//! The static loader serves these only when no bundle file exists at all, so
//! the header, navigation and footer always have text even on a fresh deploy.

use crate::i18n::Locale;

/// Built-in strings for one locale.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinStrings {
    pub locale: &'static str,
    pub entries: &'static [(&'static str, &'static str)],
}

impl BuiltinStrings {
    /// Built-in strings for a locale, if any are compiled in.
    pub fn for_locale(locale: Locale) -> Option<&'static BuiltinStrings> {
        BUILTINS.iter().find(|set| set.locale == locale.code())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static BUILTINS: &[BuiltinStrings] = &[
    BuiltinStrings {
        locale: "uk",
        entries: UK,
    },
    BuiltinStrings {
        locale: "en",
        entries: EN,
    },
];

// ==================== Ukrainian ====================

const UK: &[(&str, &str)] = &[
    ("header.company", "Компанія"),
    ("header.services", "Послуги"),
    ("header.projects", "Проекти"),
    ("header.about", "Про нас"),
    ("header.contact", "Контакти"),
    ("header.careers", "Кар'єра"),
    ("nav.home", "Головна"),
    ("nav.services", "Послуги"),
    ("nav.projects", "Проекти"),
    ("nav.about", "Про нас"),
    ("nav.contact", "Контакти"),
    ("nav.jobs", "Вакансії"),
    ("nav.menu", "Меню"),
    ("common.loading", "Завантаження..."),
    ("common.error", "Сталася помилка"),
    ("common.retry", "Спробувати знову"),
    ("common.submit", "Відправити"),
    ("common.cancel", "Скасувати"),
    ("common.back", "Назад"),
    ("common.next", "Далі"),
    ("common.close", "Закрити"),
    ("common.show_more", "Показати більше"),
    ("common.show_less", "Показати менше"),
    ("footer.company", "Компанія"),
    ("footer.services", "Послуги"),
    ("footer.projects", "Проекти"),
    ("footer.contact", "Контакти"),
    ("footer.privacy", "Політика конфіденційності"),
    ("footer.terms", "Умови використання"),
    ("footer.rights", "Всі права захищені"),
    ("contact.title", "Зв'яжіться з нами"),
    ("contact.send", "Відправити повідомлення"),
    ("contact.success", "Повідомлення успішно відправлено!"),
    ("contact.error", "Помилка відправки. Спробуйте ще раз."),
    ("form.required", "Це поле обов'язкове"),
    ("form.invalid_email", "Введіть коректну email адресу"),
];

// ==================== English ====================

const EN: &[(&str, &str)] = &[
    ("header.company", "Company"),
    ("header.services", "Services"),
    ("header.projects", "Projects"),
    ("header.about", "About Us"),
    ("header.contact", "Contact"),
    ("header.careers", "Careers"),
    ("nav.home", "Home"),
    ("nav.services", "Services"),
    ("nav.projects", "Projects"),
    ("nav.about", "About"),
    ("nav.contact", "Contact"),
    ("nav.jobs", "Jobs"),
    ("nav.menu", "Menu"),
    ("common.loading", "Loading..."),
    ("common.error", "Error occurred"),
    ("common.retry", "Try again"),
    ("common.submit", "Submit"),
    ("common.cancel", "Cancel"),
    ("common.back", "Back"),
    ("common.next", "Next"),
    ("common.close", "Close"),
    ("common.show_more", "Show More"),
    ("common.show_less", "Show Less"),
    ("footer.company", "Company"),
    ("footer.services", "Services"),
    ("footer.projects", "Projects"),
    ("footer.contact", "Contact"),
    ("footer.privacy", "Privacy Policy"),
    ("footer.terms", "Terms of Service"),
    ("footer.rights", "All rights reserved"),
    ("contact.title", "Contact Us"),
    ("contact.send", "Send Message"),
    ("contact.success", "Message sent successfully!"),
    ("contact.error", "Error sending message. Please try again."),
    ("form.required", "This field is required"),
    ("form.invalid_email", "Please enter a valid email address"),
];
