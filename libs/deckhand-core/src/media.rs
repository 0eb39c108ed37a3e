//! Media references embedded in field markup.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static SOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[sound:([^\]]+)\]").expect("sound pattern is valid"));

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("image pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Sound,
    Image,
}

/// A media file named in field text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub file: String,
}

/// Media references in `text`, in order of appearance.
pub fn references(text: &str) -> Vec<MediaRef> {
    let sounds = SOUND.captures_iter(text).filter_map(|caps| {
        let m = caps.get(1)?;
        Some((caps.get(0)?.start(), MediaKind::Sound, m.as_str()))
    });
    let images = IMAGE.captures_iter(text).filter_map(|caps| {
        let m = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
        Some((caps.get(0)?.start(), MediaKind::Image, m.as_str()))
    });

    let mut found: Vec<_> = sounds.chain(images).filter(|(_, _, file)| !file.is_empty()).collect();
    found.sort_by_key(|(start, _, _)| *start);
    found
        .into_iter()
        .map(|(_, kind, file)| MediaRef {
            kind,
            file: file.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_sound_and_images_in_order() {
        let text = r#"<img src="a.png"> say [sound:hello.mp3] <IMG class=x SRC='b c.jpg'>"#;
        assert_eq!(
            references(text),
            vec![
                MediaRef {
                    kind: MediaKind::Image,
                    file: "a.png".to_string()
                },
                MediaRef {
                    kind: MediaKind::Sound,
                    file: "hello.mp3".to_string()
                },
                MediaRef {
                    kind: MediaKind::Image,
                    file: "b c.jpg".to_string()
                },
            ]
        );
    }

    #[test]
    fn unquoted_src() {
        let refs = references("<img src=pic.gif>");
        assert_eq!(refs[0].file, "pic.gif");
    }

    #[test]
    fn plain_text_has_no_media() {
        assert!(references("[sound:] <image src=x> plain").is_empty());
    }
}
