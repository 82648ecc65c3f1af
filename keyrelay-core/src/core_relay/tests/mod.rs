mod routing_table_tests;
mod router_tests;
