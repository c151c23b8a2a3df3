mod shop_handler;

pub use shop_handler::{
    __path_get_print_page, __path_get_shop, __path_get_shop_print_page, get_print_page,
    get_shop, get_shop_print_page,
};
