mod date_parser_tests;
mod html_snapshot_tests;
mod price_and_geo_tests;
