//! Prompt template for typographic poster images.

/// Combine the on-image text, decorative keywords, and background color into one prompt.
///
/// The template is written for the backend's Chinese-language model.
pub fn compose_image_prompt(text: &str, illustration: &str, color: &str) -> String {
    format!(
        "字体设计：\"{}\"，黑色字体，斜体，带阴影。干净的背景，白色到{}渐变。点缀浅灰色、半透明{}等元素插图做配饰插画。",
        text, color, illustration
    )
}
