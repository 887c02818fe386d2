/// Turn a title into a URL slug: lowercase, alphanumerics kept, everything
/// else collapsed into single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = true;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_titles() {
        assert_eq!(slugify("Visa Services in Dubai"), "visa-services-in-dubai");
        assert_eq!(slugify("10 Days / 9 Nights!"), "10-days-9-nights");
    }

    #[test]
    fn collapses_and_trims_separators() {
        assert_eq!(slugify("  --Hello,   World--  "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }
}
