//! Class lists that ship with well-known detection benchmarks.

use serde::{Deserialize, Serialize};

/// The 80 COCO detection classes in category-id order.
pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// The 365 Objects365 classes in category-id order.
pub const OBJECTS365_CLASSES: [&str; 365] = [
    "person",
    "sneakers",
    "chair",
    "other_shoes",
    "hat",
    "car",
    "lamp",
    "glasses",
    "bottle",
    "desk",
    "cup",
    "street_lights",
    "cabinet_shelf",
    "handbag_satchel",
    "bracelet",
    "plate",
    "picture_frame",
    "helmet",
    "book",
    "gloves",
    "storage_box",
    "boat",
    "leather_shoes",
    "flower",
    "bench",
    "potted_plant",
    "bowl_basin",
    "flag",
    "pillow",
    "boots",
    "vase",
    "microphone",
    "necklace",
    "ring",
    "suv",
    "wine_glass",
    "belt",
    "monitor_tv",
    "backpack",
    "umbrella",
    "traffic_light",
    "speaker",
    "watch",
    "tie",
    "trash_bin_can",
    "slippers",
    "bicycle",
    "stool",
    "barrel_bucket",
    "van",
    "couch",
    "sandals",
    "basket",
    "drum",
    "pen_pencil",
    "bus",
    "wild_bird",
    "high_heels",
    "motorcycle",
    "guitar",
    "carpet",
    "cell_phone",
    "bread",
    "camera",
    "canned",
    "truck",
    "traffic_cone",
    "cymbal",
    "lifesaver",
    "towel",
    "stuffed_toy",
    "candle",
    "sailboat",
    "laptop",
    "awning",
    "bed",
    "faucet",
    "tent",
    "horse",
    "mirror",
    "power_outlet",
    "sink",
    "apple",
    "air_conditioner",
    "knife",
    "hockey_stick",
    "paddle",
    "pickup_truck",
    "fork",
    "traffic_sign",
    "balloon",
    "tripod",
    "dog",
    "spoon",
    "clock",
    "pot",
    "cow",
    "cake",
    "dinning_table",
    "sheep",
    "hanger",
    "blackboard_whiteboard",
    "napkin",
    "other_fish",
    "orange_tangerine",
    "toiletry",
    "keyboard",
    "tomato",
    "lantern",
    "machinery_vehicle",
    "fan",
    "green_vegetables",
    "banana",
    "baseball_glove",
    "airplane",
    "mouse",
    "train",
    "pumpkin",
    "soccer",
    "skiboard",
    "luggage",
    "nightstand",
    "tea_pot",
    "telephone",
    "trolley",
    "head_phone",
    "sports_car",
    "stop_sign",
    "dessert",
    "scooter",
    "stroller",
    "crane",
    "remote",
    "refrigerator",
    "oven",
    "lemon",
    "duck",
    "baseball_bat",
    "surveillance_camera",
    "cat",
    "jug",
    "broccoli",
    "piano",
    "pizza",
    "elephant",
    "skateboard",
    "surfboard",
    "gun",
    "skating_and_skiing_shoes",
    "gas_stove",
    "donut",
    "bow_tie",
    "carrot",
    "toilet",
    "kite",
    "strawberry",
    "other_balls",
    "shovel",
    "pepper",
    "computer_box",
    "toilet_paper",
    "cleaning_products",
    "chopsticks",
    "microwave",
    "pigeon",
    "baseball",
    "cutting_chopping_board",
    "coffee_table",
    "side_table",
    "scissors",
    "marker",
    "pie",
    "ladder",
    "snowboard",
    "cookies",
    "radiator",
    "fire_hydrant",
    "basketball",
    "zebra",
    "grape",
    "giraffe",
    "potato",
    "sausage",
    "tricycle",
    "violin",
    "egg",
    "fire_extinguisher",
    "candy",
    "fire_truck",
    "billiards",
    "converter",
    "bathtub",
    "wheelchair",
    "golf_club",
    "briefcase",
    "cucumber",
    "cigar_cigarette",
    "paint_brush",
    "pear",
    "heavy_truck",
    "hamburger",
    "extractor",
    "extension_cord",
    "tong",
    "tennis_racket",
    "folder",
    "american_football",
    "earphone",
    "mask",
    "kettle",
    "tennis",
    "ship",
    "swing",
    "coffee_machine",
    "slide",
    "carriage",
    "onion",
    "green_beans",
    "projector",
    "frisbee",
    "washing_machine_drying_machine",
    "chicken",
    "printer",
    "watermelon",
    "saxophone",
    "tissue",
    "toothbrush",
    "ice_cream",
    "hot_air_balloon",
    "cello",
    "french_fries",
    "scale",
    "trophy",
    "cabbage",
    "hot_dog",
    "blender",
    "peach",
    "rice",
    "wallet_purse",
    "volleyball",
    "deer",
    "goose",
    "tape",
    "tablet",
    "cosmetics",
    "trumpet",
    "pineapple",
    "golf_ball",
    "ambulance",
    "parking_meter",
    "mango",
    "key",
    "hurdle",
    "fishing_rod",
    "medal",
    "flute",
    "brush",
    "penguin",
    "megaphone",
    "corn",
    "lettuce",
    "garlic",
    "swan",
    "helicopter",
    "green_onion",
    "sandwich",
    "nuts",
    "speed_limit_sign",
    "induction_cooker",
    "broom",
    "trombone",
    "plum",
    "rickshaw",
    "goldfish",
    "kiwi_fruit",
    "router_modem",
    "poker_card",
    "toaster",
    "shrimp",
    "sushi",
    "cheese",
    "notepaper",
    "cherry",
    "pliers",
    "cd",
    "pasta",
    "hammer",
    "cue",
    "avocado",
    "hamimelon",
    "flask",
    "mushroom",
    "screwdriver",
    "soap",
    "recorder",
    "bear",
    "eggplant",
    "board_eraser",
    "coconut",
    "tape_measure_ruler",
    "pig",
    "showerhead",
    "globe",
    "chips",
    "steak",
    "crosswalk_sign",
    "stapler",
    "camel",
    "formula_1",
    "pomegranate",
    "dishwasher",
    "crab",
    "hoverboard",
    "meat_ball",
    "rice_cooker",
    "tuba",
    "calculator",
    "papaya",
    "antelope",
    "parrot",
    "seal",
    "butterfly",
    "dumbbell",
    "donkey",
    "lion",
    "urinal",
    "dolphin",
    "electric_drill",
    "hair_dryer",
    "egg_tart",
    "jellyfish",
    "treadmill",
    "lighter",
    "grapefruit",
    "game_board",
    "mop",
    "radish",
    "baozi",
    "target",
    "french",
    "spring_rolls",
    "monkey",
    "rabbit",
    "pencil_case",
    "yak",
    "red_cabbage",
    "binoculars",
    "asparagus",
    "barbell",
    "scallop",
    "noddles",
    "comb",
    "dumpling",
    "oyster",
    "table_tennis_paddle",
    "cosmetics_brush_eyeliner_pencil",
    "chainsaw",
    "eraser",
    "lobster",
    "durian",
    "okra",
    "lipstick",
    "cosmetics_mirror",
    "curling",
    "table_tennis",
];

/// The 20 Pascal VOC classes.
pub const VOC_CLASSES: [&str; 20] = [
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// A hardcoded name list selectable from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinList {
    Coco,
    Objects365,
    Voc,
}

impl BuiltinList {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            BuiltinList::Coco => &COCO_CLASSES,
            BuiltinList::Objects365 => &OBJECTS365_CLASSES,
            BuiltinList::Voc => &VOC_CLASSES,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuiltinList::Coco => "builtin:coco",
            BuiltinList::Objects365 => "builtin:objects365",
            BuiltinList::Voc => "builtin:voc",
        }
    }
}
