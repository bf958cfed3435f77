/// ASCII letters paired with their Cyrillic look-alikes.
const CONFUSABLES: &[(char, char)] = &[
    ('a', '\u{0430}'),
    ('c', '\u{0441}'),
    ('e', '\u{0435}'),
    ('i', '\u{0456}'),
    ('j', '\u{0458}'),
    ('o', '\u{043E}'),
    ('p', '\u{0440}'),
    ('s', '\u{0455}'),
    ('x', '\u{0445}'),
    ('y', '\u{0443}'),
    ('A', '\u{0410}'),
    ('B', '\u{0412}'),
    ('C', '\u{0421}'),
    ('E', '\u{0415}'),
    ('H', '\u{041D}'),
    ('K', '\u{041A}'),
    ('M', '\u{041C}'),
    ('O', '\u{041E}'),
    ('P', '\u{0420}'),
    ('T', '\u{0422}'),
    ('X', '\u{0425}'),
];

/// The visually confusable partner of `c`, in either direction.
pub fn confusable(c: char) -> Option<char> {
    CONFUSABLES.iter().find_map(|&(ascii, lookalike)| {
        if c == ascii {
            Some(lookalike)
        } else if c == lookalike {
            Some(ascii)
        } else {
            None
        }
    })
}

/// Swap the first confusable character of `name` for its partner.
pub fn sabotage_name(name: &str) -> Option<String> {
    let (index, original, substitute) = name
        .char_indices()
        .find_map(|(index, c)| confusable(c).map(|substitute| (index, c, substitute)))?;

    let mut sabotaged = String::with_capacity(name.len() + 2);
    sabotaged.push_str(&name[..index]);
    sabotaged.push(substitute);
    sabotaged.push_str(&name[index + original.len_utf8()..]);
    Some(sabotaged)
}
