/// Shared across providers that implement `describe_image` — not
/// tenant/step-specific the way the RAG prompt templates are, since every
/// provider needs the same instruction to make an image usable for
/// retrieval. The `[IMAGE DESCRIPTION for <filename>]` prefix is applied by
/// the caller, not here.
pub const IMAGE_DESCRIPTION_PROMPT: &str =
    "Describe this image in extreme detail for retrieval purposes. Include any \
     visible text, numbers, layout structure, and visual elements. The goal is \
     to allow someone to find this image by searching for its content.";
