use crate::parsers::geo::{Coordinates, coordinates_from_map_image, coordinates_from_map_link};
use crate::parsers::price::{CurrencyPattern, PriceQuote, parse_amount, quote_from_text};

#[cfg(test)]
mod price_tests {
    use super::*;

    #[test]
    fn test_amounts_in_order() {
        let pattern = CurrencyPattern::default();
        assert_eq!(
            pattern.amounts("New listing price ₹2,000 was ₹ 2,500"),
            vec![2000, 2500]
        );
        assert_eq!(pattern.first_amount("no price here"), None);
    }

    #[test]
    fn test_parse_amount_ignores_separators() {
        assert_eq!(parse_amount("12,345"), Some(12345));
        assert_eq!(parse_amount(",,"), None);
    }

    #[test]
    fn test_discount_quote() {
        let pattern = CurrencyPattern::default();
        let quote = quote_from_text(&pattern, "New listing price\n₹1,800\n₹2,400");
        assert_eq!(
            quote,
            Some(PriceQuote {
                base: 1800,
                original: Some(2400)
            })
        );
    }

    #[test]
    fn test_single_amount_has_no_original() {
        let pattern = CurrencyPattern::default();
        let quote = quote_from_text(&pattern, "New listing price ₹1,800").unwrap();
        assert_eq!(quote.original, None);
    }

    #[test]
    fn test_largest_first_amount_has_no_original() {
        let pattern = CurrencyPattern::default();
        let quote = quote_from_text(&pattern, "₹3,000 (was ₹2,000 last week)").unwrap();
        assert_eq!(quote.base, 3000);
        assert_eq!(quote.original, None);
    }

    #[test]
    fn test_price_range_reads_as_discount() {
        // Known ambiguity: a displayed range is indistinguishable from a
        // discount, so the upper bound is reported as the original price.
        let pattern = CurrencyPattern::default();
        let quote = quote_from_text(&pattern, "New listing price ₹2,445–₹2,574").unwrap();
        assert_eq!(quote.base, 2445);
        assert_eq!(quote.original, Some(2574));
    }

    #[test]
    fn test_leading_amount() {
        let pattern = CurrencyPattern::default();
        assert!(pattern.starts_with_amount("₹2,100"));
        assert!(!pattern.starts_with_amount("From ₹2,100"));
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = CurrencyPattern::new(r"USD\s?([\d,]+)").unwrap();
        assert_eq!(pattern.amounts("USD 120 / USD140"), vec![120, 140]);
        assert!(CurrencyPattern::new("(unclosed").is_err());
    }
}

#[cfg(test)]
mod geo_tests {
    use super::*;

    #[test]
    fn test_map_image_center() {
        let src = "https://maps.googleapis.com/maps/api/staticmap?center=10.05,76.54&zoom=14&size=600x300";
        assert_eq!(
            coordinates_from_map_image(src),
            Some(Coordinates {
                lat: 10.05,
                lng: 76.54
            })
        );
    }

    #[test]
    fn test_map_image_encoded_comma() {
        let src = "https://maps.googleapis.com/maps/api/staticmap?zoom=3&center=-33.86%2C151.2";
        let coords = coordinates_from_map_image(src).unwrap();
        assert_eq!(coords.lat, -33.86);
        assert_eq!(coords.lng, 151.2);
    }

    #[test]
    fn test_map_link_variants() {
        let at = "https://maps.google.com/maps/@12.97,77.59,15z";
        let q = "https://maps.google.com/?q=12.97,77.59";
        let expected = Some(Coordinates {
            lat: 12.97,
            lng: 77.59,
        });
        assert_eq!(coordinates_from_map_link(at), expected);
        assert_eq!(coordinates_from_map_link(q), expected);
    }

    #[test]
    fn test_malformed_coordinates_are_rejected() {
        assert_eq!(coordinates_from_map_image("https://maps.googleapis.com/?center=abc,def"), None);
        assert_eq!(coordinates_from_map_link("https://maps.google.com/@1.2.3,4"), None);
        assert_eq!(coordinates_from_map_link("https://maps.google.com/@95.0,10.0"), None);
    }
}
