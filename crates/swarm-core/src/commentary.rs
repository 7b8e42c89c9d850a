//! Review and comment text.
//!
//! [`Commentary`] is the seam for whatever writes plan reviews and blog
//! comments. The built-in [`CannedCommentary`] picks from small phrase
//! lists.

use rand::RngCore;
use rand::seq::IndexedRandom;
use swarm_types::LifecycleCategory;

/// Source of review and comment text.
pub trait Commentary: Send + Sync {
    /// Review body for a completed plan titled `title` with `rating` stars.
    fn review(
        &self,
        category: LifecycleCategory,
        title: &str,
        rating: u8,
        rng: &mut dyn RngCore,
    ) -> String;

    /// Comment body for a blog post titled `title`.
    fn blog_comment(&self, title: &str, rng: &mut dyn RngCore) -> String;
}

const DIET_PHRASES: &[&str] = &[
    "Planı bitirdim, gerçekten uygulanabilir bir diyet.",
    "Porsiyonlar doyurucuydu, aç kalmadım.",
    "Tarifler pratik, iş yoğunluğunda bile uygulayabildim.",
    "Kısa sürede fark ettim, enerjim arttı.",
];

const EXERCISE_PHRASES: &[&str] = &[
    "Programı tamamladım, kondisyonum belirgin şekilde arttı.",
    "Hareketler iyi açıklanmış, evde rahatça yaptım.",
    "Zorlayıcı ama keyifliydi, tekrar yapacağım.",
    "Süreler tam kararında, sıkılmadan bitirdim.",
];

const BLOG_PHRASES: &[&str] = &[
    "Çok faydalı bir yazı olmuş, teşekkürler.",
    "Bunu hiç bu açıdan düşünmemiştim, uygulamaya başlıyorum.",
    "Kısa ve net anlatılmış, kaydettim.",
    "Tam aradığım bilgiler, eline sağlık.",
];

/// Fixed-phrase review writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedCommentary;

impl Commentary for CannedCommentary {
    fn review(
        &self,
        category: LifecycleCategory,
        title: &str,
        rating: u8,
        rng: &mut dyn RngCore,
    ) -> String {
        let phrases = match category {
            LifecycleCategory::Diet => DIET_PHRASES,
            LifecycleCategory::Exercise => EXERCISE_PHRASES,
        };
        let phrase = phrases.choose(rng).copied().unwrap_or_default();
        let closing = if rating >= 5 { " Kesinlikle tavsiye ederim." } else { "" };
        if title.is_empty() {
            format!("{phrase}{closing}")
        } else {
            format!("{title}: {phrase}{closing}")
        }
    }

    fn blog_comment(&self, _title: &str, rng: &mut dyn RngCore) -> String {
        BLOG_PHRASES.choose(rng).copied().unwrap_or_default().to_owned()
    }
}
